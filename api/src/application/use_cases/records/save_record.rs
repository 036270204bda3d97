use uuid::Uuid;

use crate::application::errors::ServiceError;
use crate::application::ports::record_repository::RecordRepository;
use crate::domain::validation::Validate;

pub struct SaveRecord<'a, R: RecordRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R> SaveRecord<'a, R>
where
    R: RecordRepository + ?Sized,
    R::Input: Validate,
{
    pub async fn create(&self, input: &R::Input) -> Result<R::Record, ServiceError> {
        self.check(input, None).await?;
        let record = self.repo.insert(input).await?;
        Ok(record)
    }

    pub async fn update(&self, id: Uuid, input: &R::Input) -> Result<R::Record, ServiceError> {
        if self.repo.find(id).await?.is_none() {
            return Err(ServiceError::NotFound);
        }
        self.check(input, Some(id)).await?;
        self.repo
            .update(id, input)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    // Field rules first; database checks only for well-formed input.
    async fn check(&self, input: &R::Input, except: Option<Uuid>) -> Result<(), ServiceError> {
        input.validate().into_result()?;
        self.repo.conflicts(input, except).await?.into_result()?;
        Ok(())
    }
}
