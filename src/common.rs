use crate::Tag;

/// Defines the direction in which text is to be read.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Initial, unset direction.
    #[default]
    Invalid,
    /// Text is set horizontally from left to right.
    LeftToRight,
    /// Text is set horizontally from right to left.
    RightToLeft,
    /// Text is set vertically from top to bottom.
    TopToBottom,
    /// Text is set vertically from bottom to top.
    BottomToTop,
}

impl Direction {
    /// Checks that the text is set horizontally.
    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::LeftToRight | Direction::RightToLeft)
    }

    /// Checks that the direction runs in logical order.
    ///
    /// An unset direction is not forward, just like in harfbuzz.
    #[inline]
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::LeftToRight | Direction::TopToBottom)
    }

    /// Returns the horizontal direction in which `script` is normally written.
    ///
    /// Returns `None` for scripts that do not have an inherent direction.
    pub fn from_script(script: Script) -> Option<Self> {
        // Unicode-6.0 additions and older scripts that are written right-to-left.
        match script {
            script::ARABIC |
            script::HEBREW |
            script::SYRIAC |
            script::THAANA |
            script::CYPRIOT |
            script::KHAROSHTHI |
            script::PHOENICIAN |
            script::NKO |
            script::LYDIAN |
            script::AVESTAN |
            script::IMPERIAL_ARAMAIC |
            script::INSCRIPTIONAL_PAHLAVI |
            script::INSCRIPTIONAL_PARTHIAN |
            script::OLD_SOUTH_ARABIAN |
            script::OLD_TURKIC |
            script::SAMARITAN |
            script::MANDAIC |
            script::MEROITIC_CURSIVE |
            script::MEROITIC_HIEROGLYPHS |
            script::MANICHAEAN |
            script::MENDE_KIKAKUI |
            script::NABATAEAN |
            script::OLD_NORTH_ARABIAN |
            script::PALMYRENE |
            script::PSALTER_PAHLAVI |
            script::HATRAN |
            script::OLD_HUNGARIAN |
            script::ADLAM |
            script::HANIFI_ROHINGYA |
            script::OLD_SOGDIAN |
            script::SOGDIAN |
            script::ELYMAIC => Some(Direction::RightToLeft),

            script::COMMON |
            script::INHERITED |
            script::UNKNOWN => None,

            _ => Some(Direction::LeftToRight),
        }
    }
}

impl core::str::FromStr for Direction {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("invalid direction");
        }

        // harfbuzz also matches only the first letter.
        match s.as_bytes()[0].to_ascii_lowercase() {
            b'l' => Ok(Direction::LeftToRight),
            b'r' => Ok(Direction::RightToLeft),
            b't' => Ok(Direction::TopToBottom),
            b'b' => Ok(Direction::BottomToTop),
            _ => Err("invalid direction"),
        }
    }
}

/// A text language.
///
/// Stored as a lowercased BCP 47 string.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Language(String);

impl Language {
    /// Returns the language as a string.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl core::str::FromStr for Language {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() {
            Ok(Language(s.to_ascii_lowercase()))
        } else {
            Err("invalid language")
        }
    }
}

impl core::fmt::Display for Language {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

// In harfbuzz, despite having `hb_script_t`, script can actually have any tag.
// So we're doing the same.
// The only difference is that `Script` cannot be set to `HB_SCRIPT_INVALID`.
/// A text script.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Script(pub(crate) Tag);

impl Script {
    #[inline]
    pub(crate) const fn from_bytes(bytes: &[u8; 4]) -> Self {
        Script(Tag::from_bytes(bytes))
    }

    /// Converts an ISO 15924 script tag to a corresponding `Script`.
    pub fn from_iso15924_tag(tag: Tag) -> Option<Script> {
        if tag.is_null() {
            return None;
        }

        // Be lenient, adjust case (one capital letter followed by three small letters).
        let tag = Tag((tag.as_u32() & 0xDFDFDFDF) | 0x00202020);

        match &tag.to_bytes() {
            // These graduated from the 'Q' private-area codes, but
            // the old code is still aliased by Unicode, and the Qaai
            // one in use by ICU.
            b"Qaai" => return Some(script::INHERITED),
            b"Qaac" => return Some(script::COPTIC),

            // Script variants from https://unicode.org/iso15924/
            b"Cyrs" => return Some(script::CYRILLIC),
            b"Latf" | b"Latg" => return Some(script::LATIN),
            b"Syre" | b"Syrj" | b"Syrn" => return Some(script::SYRIAC),

            _ => {}
        }

        if tag.as_u32() & 0xE0E0E0E0 == 0x40606060 {
            Some(Script(tag))
        } else {
            Some(script::UNKNOWN)
        }
    }

    /// Returns script's tag.
    #[inline]
    pub fn tag(&self) -> Tag {
        self.0
    }
}

impl core::str::FromStr for Script {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = Tag::from_bytes_lossy(s.as_bytes());
        Script::from_iso15924_tag(tag).ok_or("invalid script")
    }
}

impl From<unicode_script::Script> for Script {
    fn from(script: unicode_script::Script) -> Self {
        let tag = Tag::from_bytes_lossy(script.short_name().as_bytes());
        Script::from_iso15924_tag(tag).unwrap_or(script::UNKNOWN)
    }
}

/// A feature override request.
///
/// Feature ranges are not forwarded to the shaping engine yet,
/// so features are accepted and ignored.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Feature {
    /// The feature tag.
    pub tag: Tag,
    /// The feature value. 0 disables, 1 enables, higher values select alternates.
    pub value: u32,
    /// Cluster of the first character the feature applies to.
    pub start: u32,
    /// Cluster of the last character the feature applies to.
    pub end: u32,
}

impl Feature {
    /// Create a new `Feature` struct.
    pub fn new(tag: Tag, value: u32, range: impl core::ops::RangeBounds<usize>) -> Feature {
        use core::ops::Bound;

        let start = match range.start_bound() {
            Bound::Included(&included) => included as u32,
            Bound::Excluded(&excluded) => excluded as u32 + 1,
            Bound::Unbounded => 0,
        };

        let end = match range.end_bound() {
            Bound::Included(&included) => included as u32,
            Bound::Excluded(&excluded) => (excluded as u32).saturating_sub(1),
            Bound::Unbounded => u32::MAX,
        };

        Feature {
            tag,
            value,
            start,
            end,
        }
    }
}

/// Predefined scripts.
pub mod script {
    #![allow(missing_docs)]

    use crate::Script;

    pub const COMMON: Script                    = Script::from_bytes(b"Zyyy");
    pub const INHERITED: Script                 = Script::from_bytes(b"Zinh");
    pub const UNKNOWN: Script                   = Script::from_bytes(b"Zzzz"); // Script can be Unknown, but not Invalid.
    pub const ARABIC: Script                    = Script::from_bytes(b"Arab");
    pub const ARMENIAN: Script                  = Script::from_bytes(b"Armn");
    pub const BENGALI: Script                   = Script::from_bytes(b"Beng");
    pub const CYRILLIC: Script                  = Script::from_bytes(b"Cyrl");
    pub const DEVANAGARI: Script                = Script::from_bytes(b"Deva");
    pub const GEORGIAN: Script                  = Script::from_bytes(b"Geor");
    pub const GREEK: Script                     = Script::from_bytes(b"Grek");
    pub const HAN: Script                       = Script::from_bytes(b"Hani");
    pub const HEBREW: Script                    = Script::from_bytes(b"Hebr");
    pub const HIRAGANA: Script                  = Script::from_bytes(b"Hira");
    pub const KATAKANA: Script                  = Script::from_bytes(b"Kana");
    pub const LAO: Script                       = Script::from_bytes(b"Laoo");
    pub const LATIN: Script                     = Script::from_bytes(b"Latn");
    pub const THAI: Script                      = Script::from_bytes(b"Thai");
    pub const SYRIAC: Script                    = Script::from_bytes(b"Syrc");
    pub const THAANA: Script                    = Script::from_bytes(b"Thaa");
    pub const YI: Script                        = Script::from_bytes(b"Yiii");
    pub const COPTIC: Script                    = Script::from_bytes(b"Copt");
    pub const CYPRIOT: Script                   = Script::from_bytes(b"Cprt");
    pub const KHAROSHTHI: Script                = Script::from_bytes(b"Khar");
    pub const NKO: Script                       = Script::from_bytes(b"Nkoo");
    pub const PHOENICIAN: Script                = Script::from_bytes(b"Phnx");
    pub const LYDIAN: Script                    = Script::from_bytes(b"Lydi");
    pub const VAI: Script                       = Script::from_bytes(b"Vaii");
    pub const AVESTAN: Script                   = Script::from_bytes(b"Avst");
    pub const IMPERIAL_ARAMAIC: Script          = Script::from_bytes(b"Armi");
    pub const INSCRIPTIONAL_PAHLAVI: Script     = Script::from_bytes(b"Phli");
    pub const INSCRIPTIONAL_PARTHIAN: Script    = Script::from_bytes(b"Prti");
    pub const OLD_SOUTH_ARABIAN: Script         = Script::from_bytes(b"Sarb");
    pub const OLD_TURKIC: Script                = Script::from_bytes(b"Orkh");
    pub const SAMARITAN: Script                 = Script::from_bytes(b"Samr");
    pub const MANDAIC: Script                   = Script::from_bytes(b"Mand");
    pub const MEROITIC_CURSIVE: Script          = Script::from_bytes(b"Merc");
    pub const MEROITIC_HIEROGLYPHS: Script      = Script::from_bytes(b"Mero");
    pub const MANICHAEAN: Script                = Script::from_bytes(b"Mani");
    pub const MENDE_KIKAKUI: Script             = Script::from_bytes(b"Mend");
    pub const NABATAEAN: Script                 = Script::from_bytes(b"Nbat");
    pub const OLD_NORTH_ARABIAN: Script         = Script::from_bytes(b"Narb");
    pub const PALMYRENE: Script                 = Script::from_bytes(b"Palm");
    pub const PSALTER_PAHLAVI: Script           = Script::from_bytes(b"Phlp");
    pub const HATRAN: Script                    = Script::from_bytes(b"Hatr");
    pub const OLD_HUNGARIAN: Script             = Script::from_bytes(b"Hung");
    pub const ADLAM: Script                     = Script::from_bytes(b"Adlm");
    pub const HANIFI_ROHINGYA: Script           = Script::from_bytes(b"Rohg");
    pub const OLD_SOGDIAN: Script               = Script::from_bytes(b"Sogo");
    pub const SOGDIAN: Script                   = Script::from_bytes(b"Sogd");
    pub const ELYMAIC: Script                   = Script::from_bytes(b"Elym");
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn direction_from_str() {
        assert_eq!(Direction::from_str("rtl"), Ok(Direction::RightToLeft));
        assert_eq!(Direction::from_str("LTR"), Ok(Direction::LeftToRight));
        assert_eq!(Direction::from_str("ttb"), Ok(Direction::TopToBottom));
        assert!(Direction::from_str("").is_err());
        assert!(Direction::from_str("x").is_err());
    }

    #[test]
    fn forward_directions() {
        assert!(Direction::LeftToRight.is_forward());
        assert!(Direction::TopToBottom.is_forward());
        assert!(!Direction::RightToLeft.is_forward());
        assert!(!Direction::BottomToTop.is_forward());
        assert!(!Direction::Invalid.is_forward());

        assert!(Direction::RightToLeft.is_horizontal());
        assert!(!Direction::TopToBottom.is_horizontal());
        assert!(!Direction::Invalid.is_horizontal());
    }

    #[test]
    fn script_direction() {
        assert_eq!(Direction::from_script(script::ARABIC), Some(Direction::RightToLeft));
        assert_eq!(Direction::from_script(script::LATIN), Some(Direction::LeftToRight));
        assert_eq!(Direction::from_script(script::COMMON), None);
    }

    #[test]
    fn script_from_str_is_lenient() {
        assert_eq!(Script::from_str("arab"), Ok(script::ARABIC));
        assert_eq!(Script::from_str("LATN"), Ok(script::LATIN));
        assert_eq!(Script::from_str("Latf"), Ok(script::LATIN));
        assert_eq!(Script::from_str("Qaai"), Ok(script::INHERITED));
        assert!(Script::from_str("").is_err());
    }

    #[test]
    fn script_from_unicode_script() {
        assert_eq!(Script::from(unicode_script::Script::Arabic), script::ARABIC);
        assert_eq!(Script::from(unicode_script::Script::Common), script::COMMON);
    }

    #[test]
    fn language_is_lowercased() {
        let lang = Language::from_str("zh-Hant").unwrap();
        assert_eq!(lang.as_str(), "zh-hant");
        assert!(Language::from_str("").is_err());
    }

    #[test]
    fn feature_range() {
        let tag = Tag::from_bytes(b"liga");
        let f = Feature::new(tag, 1, 2..5);
        assert_eq!((f.start, f.end), (2, 4));
        let f = Feature::new(tag, 0, ..);
        assert_eq!((f.start, f.end), (0, u32::MAX));
    }
}
