/// A font face handle.
///
/// Holds the raw font data which is handed over to the shaping service as is.
/// The data is not validated here, the service rejects fonts it cannot use.
#[derive(Clone, Copy, Debug)]
pub struct Face<'a> {
    data: &'a [u8],
    index: u32,
    scale: i32,
}

impl<'a> Face<'a> {
    /// Creates a new `Face` from data.
    ///
    /// Data will be referenced, not owned.
    pub fn from_slice(data: &'a [u8], face_index: u32) -> Self {
        let scale = ttf_parser::Face::parse(data, face_index)
            .map(|face| i32::from(face.units_per_em()))
            .unwrap_or(1000);

        Face {
            data,
            index: face_index,
            scale,
        }
    }

    /// Returns the raw font data.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the face index inside a font collection.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the font scale.
    ///
    /// Units per EM by default, or 1000 for data that cannot be parsed.
    #[inline]
    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Sets the font scale, which becomes the requested font height.
    #[inline]
    pub fn set_scale(&mut self, scale: i32) {
        self.scale = scale;
    }

    /// Returns face's units per EM.
    pub fn units_per_em(&self) -> Option<u16> {
        self.parse().map(|face| face.units_per_em())
    }

    /// Returns face's family name, if any.
    pub fn family_name(&self) -> Option<String> {
        let face = self.parse()?;
        let names = face.names();
        let mut fallback = None;
        for name in names {
            if name.name_id == ttf_parser::name_id::TYPOGRAPHIC_FAMILY && name.is_unicode() {
                if let Some(family) = name.to_string() {
                    return Some(family);
                }
            }

            if name.name_id == ttf_parser::name_id::FAMILY
                && name.is_unicode()
                && fallback.is_none()
            {
                fallback = name.to_string();
            }
        }

        fallback
    }

    fn parse(&self) -> Option<ttf_parser::Face<'a>> {
        ttf_parser::Face::parse(self.data, self.index).ok()
    }
}
