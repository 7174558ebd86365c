mod manifest;

pub use manifest::ParamManifest;
