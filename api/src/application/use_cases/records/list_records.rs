use crate::application::ports::record_repository::RecordRepository;
use crate::domain::paging::{ListFilter, Page};

pub struct ListRecords<'a, R: RecordRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: RecordRepository + ?Sized> ListRecords<'a, R> {
    pub async fn execute(&self, filter: &ListFilter) -> anyhow::Result<Page<R::Record>> {
        self.repo.list(filter).await
    }
}
