mod local;

pub use local::LocalCredentialProvider;
