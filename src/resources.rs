//! Font and device plumbing a shaping service needs for the duration of a call.

use crate::face::Face;
use crate::shape::ShapeError;

/// The longest face name a logical font can request, in UTF-16 code units.
const FACE_NAME_MAX_LEN: usize = 31;

/// A request for a logical font.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FontDescriptor {
    /// Font height in device units.
    pub height: i32,
    /// Face name of a previously registered font.
    pub face_name: String,
}

impl FontDescriptor {
    /// Builds a descriptor for `face` on a device with the given vertical DPI.
    pub fn new(face: &Face, dpi: i32) -> Self {
        let mut face_name = String::new();
        let mut units = 0;
        for c in face.family_name().unwrap_or_default().chars() {
            units += c.len_utf16();
            if units > FACE_NAME_MAX_LEN {
                break;
            }
            face_name.push(c);
        }

        FontDescriptor {
            height: mul_div(face.scale(), dpi, 72),
            face_name,
        }
    }
}

// a * b / c with a 64-bit intermediate, rounded half away from zero.
// Returns -1 on division by zero or overflow.
fn mul_div(a: i32, b: i32, c: i32) -> i32 {
    if c == 0 {
        return -1;
    }

    let n = i64::from(a) * i64::from(b);
    let d = i64::from(c);
    let q = (n.abs() + d.abs() / 2) / d.abs();
    let q = if (n < 0) != (d < 0) { -q } else { q };
    i32::try_from(q).unwrap_or(-1)
}

/// Platform font and device resources.
///
/// Everything acquired through this trait is scoped to a single shaping call
/// and released before the call returns.
pub trait FontResources {
    /// A privately registered font.
    type FontHandle;
    /// A rendering context.
    type Context;
    /// A logical font selected into a rendering context.
    type Font;

    /// Registers raw font data for the calling process only.
    fn register_font(&mut self, data: &[u8]) -> Option<Self::FontHandle>;

    /// Removes a registration made by [`register_font`](Self::register_font).
    fn unregister_font(&mut self, handle: Self::FontHandle);

    /// Acquires a rendering context.
    fn acquire_context(&mut self) -> Option<Self::Context>;

    /// Releases a context acquired by [`acquire_context`](Self::acquire_context).
    fn release_context(&mut self, context: Self::Context);

    /// Returns the vertical resolution of the context.
    fn device_dpi(&self, context: &Self::Context) -> i32;

    /// Creates a logical font and selects it into `context`.
    fn create_font(
        &mut self,
        context: &mut Self::Context,
        descriptor: &FontDescriptor,
    ) -> Option<Self::Font>;

    /// Deletes a font created by [`create_font`](Self::create_font).
    fn delete_font(&mut self, font: Self::Font);
}

/// Resources held for the duration of a shaping attempt.
///
/// Releases everything that was acquired when dropped, so a failed
/// or retried attempt cannot leak a registration or a context.
pub(crate) struct ResourceScope<'r, R: FontResources> {
    resources: &'r mut R,
    handle: Option<R::FontHandle>,
    context: Option<R::Context>,
    font: Option<R::Font>,
}

impl<'r, R: FontResources> ResourceScope<'r, R> {
    pub fn acquire(resources: &'r mut R, face: &Face) -> Result<Self, ShapeError> {
        let data = face.data();
        if data.is_empty() {
            return Err(ShapeError::EmptyFontData);
        }

        let mut scope = ResourceScope {
            resources,
            handle: None,
            context: None,
            font: None,
        };

        scope.handle = Some(
            scope
                .resources
                .register_font(data)
                .ok_or(ShapeError::FontRegistration)?,
        );

        let mut context = scope
            .resources
            .acquire_context()
            .ok_or(ShapeError::RenderContext)?;

        let descriptor = FontDescriptor::new(face, scope.resources.device_dpi(&context));
        let font = scope.resources.create_font(&mut context, &descriptor);
        scope.context = Some(context);
        scope.font = Some(font.ok_or(ShapeError::LogicalFont)?);

        log::trace!(
            "acquired font resources for {:?} at height {}",
            descriptor.face_name,
            descriptor.height
        );

        Ok(scope)
    }

    pub fn context_mut(&mut self) -> Result<&mut R::Context, ShapeError> {
        self.context.as_mut().ok_or(ShapeError::RenderContext)
    }
}

impl<R: FontResources> Drop for ResourceScope<'_, R> {
    fn drop(&mut self) {
        if let Some(context) = self.context.take() {
            self.resources.release_context(context);
        }

        if let Some(font) = self.font.take() {
            self.resources.delete_font(font);
        }

        if let Some(handle) = self.handle.take() {
            self.resources.unregister_font(handle);
        }
    }
}

/// A rendering context of [`MemoryResources`].
#[derive(Clone, Debug)]
pub struct MemoryContext {
    dpi: i32,
    font: Option<FontDescriptor>,
}

impl MemoryContext {
    /// Returns the font currently selected into the context.
    #[inline]
    pub fn font(&self) -> Option<&FontDescriptor> {
        self.font.as_ref()
    }
}

/// A handle to a font registered with [`MemoryResources`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MemoryFontHandle(usize);

/// In-process font resources.
///
/// Keeps its own copy of every registered font and counts everything that is
/// currently acquired, which makes leaks observable.
#[derive(Clone, Debug)]
pub struct MemoryResources {
    dpi: i32,
    fonts: Vec<Option<Vec<u8>>>,
    contexts: usize,
    logical_fonts: usize,
}

impl MemoryResources {
    /// Creates resources that report a 72 DPI device,
    /// so that font heights match the face scale.
    pub fn new() -> Self {
        Self::with_dpi(72)
    }

    /// Creates resources that report a device with the given vertical DPI.
    pub fn with_dpi(dpi: i32) -> Self {
        MemoryResources {
            dpi,
            fonts: Vec::new(),
            contexts: 0,
            logical_fonts: 0,
        }
    }

    /// Returns the number of registrations, contexts and fonts that were not released yet.
    pub fn outstanding(&self) -> usize {
        let registered = self.fonts.iter().filter(|f| f.is_some()).count();
        registered + self.contexts + self.logical_fonts
    }
}

impl Default for MemoryResources {
    fn default() -> Self {
        Self::new()
    }
}

impl FontResources for MemoryResources {
    type FontHandle = MemoryFontHandle;
    type Context = MemoryContext;
    type Font = FontDescriptor;

    fn register_font(&mut self, data: &[u8]) -> Option<MemoryFontHandle> {
        if data.is_empty() {
            return None;
        }

        self.fonts.push(Some(data.to_vec()));
        Some(MemoryFontHandle(self.fonts.len() - 1))
    }

    fn unregister_font(&mut self, handle: MemoryFontHandle) {
        if let Some(font) = self.fonts.get_mut(handle.0) {
            *font = None;
        }
    }

    fn acquire_context(&mut self) -> Option<MemoryContext> {
        self.contexts += 1;
        Some(MemoryContext {
            dpi: self.dpi,
            font: None,
        })
    }

    fn release_context(&mut self, _: MemoryContext) {
        self.contexts -= 1;
    }

    fn device_dpi(&self, context: &MemoryContext) -> i32 {
        context.dpi
    }

    fn create_font(
        &mut self,
        context: &mut MemoryContext,
        descriptor: &FontDescriptor,
    ) -> Option<FontDescriptor> {
        self.logical_fonts += 1;
        context.font = Some(descriptor.clone());
        Some(descriptor.clone())
    }

    fn delete_font(&mut self, _: FontDescriptor) {
        self.logical_fonts -= 1;
    }
}
