pub mod template_library;
pub mod template_source;
