use uuid::Uuid;

use crate::application::errors::ServiceError;
use crate::application::ports::record_repository::RecordRepository;

pub struct GetRecord<'a, R: RecordRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: RecordRepository + ?Sized> GetRecord<'a, R> {
    pub async fn execute(&self, id: Uuid) -> Result<R::Record, ServiceError> {
        self.repo.find(id).await?.ok_or(ServiceError::NotFound)
    }
}
