//! Named, versioned cache partitions.

use std::fmt;

/// A logical partition of the offline cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
  AppShell,
  StaticAssets,
  Fonts,
  Cdn,
  Data,
  QuranApi,
  Pdfs,
}

impl Bucket {
  pub const ALL: [Bucket; 7] = [
    Bucket::AppShell,
    Bucket::StaticAssets,
    Bucket::Fonts,
    Bucket::Cdn,
    Bucket::Data,
    Bucket::QuranApi,
    Bucket::Pdfs,
  ];

  /// Unversioned bucket prefix
  pub fn prefix(self) -> &'static str {
    match self {
      Bucket::AppShell => "app-shell",
      Bucket::StaticAssets => "static-assets",
      Bucket::Fonts => "fonts",
      Bucket::Cdn => "cdn",
      Bucket::Data => "data",
      Bucket::QuranApi => "quran-api",
      Bucket::Pdfs => "pdfs",
    }
  }
}

impl fmt::Display for Bucket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.prefix())
  }
}

/// The set of bucket names declared by one cache version.
///
/// Every bucket shares the version tag. Changing it renames all of them,
/// which is how the whole cache is invalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSet {
  version: String,
}

impl BucketSet {
  pub fn new(version: impl Into<String>) -> Self {
    Self {
      version: version.into(),
    }
  }

  pub fn version(&self) -> &str {
    &self.version
  }

  /// Storage name for a bucket, e.g. `fonts-v1.4`.
  pub fn name(&self, bucket: Bucket) -> String {
    format!("{}-{}", bucket.prefix(), self.version)
  }

  /// All declared names, in `Bucket::ALL` order.
  pub fn names(&self) -> Vec<String> {
    Bucket::ALL.iter().map(|b| self.name(*b)).collect()
  }

  pub fn is_declared(&self, name: &str) -> bool {
    Bucket::ALL.iter().any(|b| self.name(*b) == name)
  }
}
