pub mod bundle;

pub use bundle::{
    AnalysisStep, AnalyzeRequest, AnalyzeResult, BundleError, BundleFinderClient, Suspect,
    DEFAULT_BUNDLE_URL,
};
