use uuid::Uuid;

use crate::application::errors::ServiceError;
use crate::application::ports::record_repository::RecordRepository;

pub struct SetRecordActive<'a, R: RecordRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: RecordRepository + ?Sized> SetRecordActive<'a, R> {
    /// Soft delete; refused while active records still reference this one.
    pub async fn deactivate(&self, id: Uuid) -> Result<(), ServiceError> {
        if self.repo.find(id).await?.is_none() {
            return Err(ServiceError::NotFound);
        }
        let dependents = self.repo.active_dependents(id).await?;
        if dependents > 0 {
            return Err(ServiceError::InUse { dependents });
        }
        self.repo.set_active(id, false).await?;
        Ok(())
    }

}

impl<'a, R> SetRecordActive<'a, R>
where
    R: RecordRepository + ?Sized,
    R::Input: for<'r> From<&'r R::Record>,
{
    /// Reactivation must satisfy the same parent and active-scope rules as
    /// saving the record in its current state.
    pub async fn activate(&self, id: Uuid) -> Result<(), ServiceError> {
        let Some(record) = self.repo.find(id).await? else {
            return Err(ServiceError::NotFound);
        };
        let input = R::Input::from(&record);
        self.repo.conflicts(&input, Some(id)).await?.into_result()?;
        if !self.repo.set_active(id, true).await? {
            return Err(ServiceError::NotFound);
        }
        Ok(())
    }
}
