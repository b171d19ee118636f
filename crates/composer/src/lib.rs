//! Composition surface for the overlay: draft buffer, template catalog,
//! template-creation dialog and the markup rendered into the mount point.

mod draft;
mod surface;
mod templates;

pub use draft::Draft;
pub use surface::{CompositionSurface, SurfaceAction};
pub use templates::{Template, TemplateCatalog, TemplateDialog, TemplateError};
