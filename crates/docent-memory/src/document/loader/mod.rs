#[cfg(feature = "pdf")]
mod pdf;
mod text;

#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;
#[cfg(all(test, feature = "pdf"))]
pub(crate) use pdf::sample_pdf;
pub use text::TextLoader;
