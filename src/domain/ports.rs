use crate::domain::model::{BucketSpec, Category};
use crate::utils::error::Result;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn category(&self) -> Category;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn compress(&self) -> bool;
    fn archive_name(&self) -> String {
        format!("{}_dashboard.zip", self.category())
    }
    fn age_histogram(&self) -> BucketSpec {
        BucketSpec::default()
    }
}
