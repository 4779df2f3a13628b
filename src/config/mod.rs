mod options;

pub use options::CatchupOptions;
pub use options::CatchupOptionsValidated;
