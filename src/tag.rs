use crate::common::{script, Language, Script};
use crate::Tag;

/// The OpenType tag of the default language system.
pub const DEFAULT_LANGUAGE: Tag = Tag::from_bytes(b"dflt");
/// The OpenType tag of the default script.
pub const DEFAULT_SCRIPT: Tag = Tag::from_bytes(b"DFLT");

#[derive(Clone, Copy)]
struct LangTag {
    language: &'static str,
    tag: Tag,
}

const fn lang(language: &'static str, tag: &[u8; 4]) -> LangTag {
    LangTag {
        language,
        tag: Tag::from_bytes(tag),
    }
}

// Sorted by language, so it can be binary searched.
#[rustfmt::skip]
const OT_LANGUAGES: &[LangTag] = &[
    lang("af", b"AFK "),
    lang("am", b"AMH "),
    lang("ar", b"ARA "),
    lang("as", b"ASM "),
    lang("az", b"AZE "),
    lang("be", b"BEL "),
    lang("bg", b"BGR "),
    lang("bn", b"BEN "),
    lang("bo", b"TIB "),
    lang("br", b"BRE "),
    lang("bs", b"BOS "),
    lang("ca", b"CAT "),
    lang("cs", b"CSY "),
    lang("cy", b"WEL "),
    lang("da", b"DAN "),
    lang("de", b"DEU "),
    lang("dv", b"DIV "),
    lang("el", b"ELL "),
    lang("en", b"ENG "),
    lang("eo", b"NTO "),
    lang("es", b"ESP "),
    lang("et", b"ETI "),
    lang("eu", b"EUQ "),
    lang("fa", b"FAR "),
    lang("fi", b"FIN "),
    lang("fo", b"FOS "),
    lang("fr", b"FRA "),
    lang("ga", b"IRI "),
    lang("gd", b"GAE "),
    lang("gl", b"GAL "),
    lang("gu", b"GUJ "),
    lang("he", b"IWR "),
    lang("hi", b"HIN "),
    lang("hr", b"HRV "),
    lang("hu", b"HUN "),
    lang("hy", b"HYE "),
    lang("id", b"IND "),
    lang("is", b"ISL "),
    lang("it", b"ITA "),
    lang("ja", b"JAN "),
    lang("ka", b"KAT "),
    lang("kk", b"KAZ "),
    lang("km", b"KHM "),
    lang("kn", b"KAN "),
    lang("ko", b"KOR "),
    lang("ku", b"KUR "),
    lang("ky", b"KIR "),
    lang("la", b"LAT "),
    lang("lo", b"LAO "),
    lang("lt", b"LTH "),
    lang("lv", b"LVI "),
    lang("mk", b"MKD "),
    lang("ml", b"MAL "),
    lang("mn", b"MNG "),
    lang("mr", b"MAR "),
    lang("ms", b"MLY "),
    lang("mt", b"MTS "),
    lang("my", b"BRM "),
    lang("ne", b"NEP "),
    lang("nl", b"NLD "),
    lang("no", b"NOR "),
    lang("or", b"ORI "),
    lang("pa", b"PAN "),
    lang("pl", b"PLK "),
    lang("ps", b"PAS "),
    lang("pt", b"PTG "),
    lang("ro", b"ROM "),
    lang("ru", b"RUS "),
    lang("sa", b"SAN "),
    lang("sd", b"SND "),
    lang("si", b"SNH "),
    lang("sk", b"SKY "),
    lang("sl", b"SLV "),
    lang("sq", b"SQI "),
    lang("sr", b"SRB "),
    lang("sv", b"SVE "),
    lang("sw", b"SWK "),
    lang("ta", b"TAM "),
    lang("te", b"TEL "),
    lang("th", b"THA "),
    lang("ti", b"TGY "),
    lang("tk", b"TKM "),
    lang("tr", b"TRK "),
    lang("uk", b"UKR "),
    lang("ur", b"URD "),
    lang("uz", b"UZB "),
    lang("vi", b"VIT "),
    lang("yi", b"JII "),
    lang("zh", b"ZHS "),
];

/// Converts a BCP 47 language to an OpenType language system tag.
///
/// Unknown languages map to [`DEFAULT_LANGUAGE`].
pub fn language_tag(language: &Language) -> Tag {
    let s = language.as_str();

    // Private-use override, e.g. `en-x-hbotabcd`.
    if let Some(pos) = s.find("x-hbot") {
        let bytes = &s.as_bytes()[pos + 6..];
        let len = bytes
            .iter()
            .take(4)
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        if len > 0 {
            return uppercase_tag(&bytes[..len]);
        }
    }

    let primary = s.split(is_subtag_separator).next().unwrap_or(s);

    if primary == "zh" {
        return chinese_tag(s);
    }

    if let Ok(idx) = OT_LANGUAGES.binary_search_by(|entry| entry.language.cmp(primary)) {
        return OT_LANGUAGES[idx].tag;
    }

    // ISO 639-3 codes usually match the OpenType tag.
    if primary.len() == 3 && primary.bytes().all(|b| b.is_ascii_alphabetic()) {
        return uppercase_tag(primary.as_bytes());
    }

    DEFAULT_LANGUAGE
}

fn uppercase_tag(bytes: &[u8]) -> Tag {
    let mut upper = [b' '; 4];
    for (dst, src) in upper.iter_mut().zip(bytes) {
        *dst = src.to_ascii_uppercase();
    }
    Tag::from_bytes(&upper)
}

fn chinese_tag(s: &str) -> Tag {
    let mut subtags = s.split(is_subtag_separator).skip(1);
    let traditional = subtags.any(|subtag| matches!(subtag, "hant" | "tw" | "mo" | "hk"));
    if !traditional {
        return Tag::from_bytes(b"ZHS ");
    }

    if s.ends_with("-hk") || s.contains("-hk-") {
        Tag::from_bytes(b"ZHH ")
    } else {
        Tag::from_bytes(b"ZHT ")
    }
}

fn is_subtag_separator(c: char) -> bool {
    c == '-' || c == '_'
}

/// Converts a script to an old-style OpenType script tag.
///
/// This is the tag set the system complex-script engines understand.
pub fn script_tag(script: Script) -> Tag {
    match script {
        script::COMMON | script::INHERITED | script::UNKNOWN => DEFAULT_SCRIPT,
        // KATAKANA and HIRAGANA both map to 'kana'.
        script::HIRAGANA => Tag::from_bytes(b"kana"),
        // Spaces at the end are preserved, unlike ISO 15924.
        script::LAO => Tag::from_bytes(b"lao "),
        script::YI => Tag::from_bytes(b"yi  "),
        // Unicode 5.0 additions.
        script::NKO => Tag::from_bytes(b"nko "),
        // Unicode 5.1 additions.
        script::VAI => Tag::from_bytes(b"vai "),
        // Else, just change first char to lowercase and return.
        _ => Tag(script.tag().as_u32() | 0x20000000),
    }
}
