use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Fatal marking errors
/// - [`Error::ResolutionFailure`] - A reference could not be bound to a loaded definition
/// - [`Error::ConfigurationError`] - The marker was started without any roots
///
/// Both abort the whole marking pass. The annotation store must not be handed to a sweep
/// stage after either of them.
///
/// ## Data errors
/// - [`Error::Malformed`] - Corrupted custom attribute blob or type name. The mark step
///   recovers from these locally, other callers see them as regular errors.
///
/// ## Configuration input
/// - [`Error::Descriptor`] - Semantically invalid linker descriptor
/// - [`Error::XmlError`] - Syntactically invalid linker descriptor
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// # Examples
///
/// ```rust
/// use dotlink::{Error, metadata::builder::ModelBuilder, linker::LinkContext};
///
/// let model = ModelBuilder::new().finish();
/// let mut context = LinkContext::new(&model);
///
/// match context.mark() {
///     Err(Error::ConfigurationError(message)) => println!("nothing to keep: {message}"),
///     Err(e) => println!("marking failed: {e}"),
///     Ok(stats) => println!("{} nodes marked", stats.marked),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A reference could not be resolved against the loaded assemblies.
    ///
    /// Raised when a type, method or field reference points at a scope that is not loaded,
    /// or at a member that does not exist in the scope it names. The associated string
    /// describes the reference that failed to resolve.
    #[error("Failed to resolve {0}")]
    ResolutionFailure(String),

    /// The marker has been misconfigured.
    ///
    /// The only trigger today is an empty root set: after initialization no method was
    /// queued for processing.
    #[error("Invalid configuration - {0}")]
    ConfigurationError(String),

    /// The data is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The linker descriptor is well-formed XML but describes something invalid,
    /// e.g. an unknown preserve mode or an assembly that is not loaded.
    #[error("Invalid descriptor - {0}")]
    Descriptor(String),

    /// The linker descriptor is not well-formed XML.
    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlError(quick_xml::Error::InvalidAttr(error))
    }
}
