//! SDK provider traits implemented by the JSON providers.

use async_trait::async_trait;
use data_access_sdk::{
    AccountAttributes, AttributeDataAccessProvider, AttributeTable, AuthenticationAttributes,
    CredentialDataAccessProvider, DataAccessError, SubjectAttributes,
};
use secrecy::SecretString;

use super::attributes::JsonAttributeProvider;
use super::credentials::JsonCredentialProvider;

#[async_trait]
impl AttributeDataAccessProvider for JsonAttributeProvider {
    async fn get_attributes(&self, subject: &str) -> Result<AttributeTable, DataAccessError> {
        Ok(self
            .get_attributes(&SubjectAttributes::of_subject(subject))
            .await?)
    }

    async fn get_attributes_for(
        &self,
        subject_attributes: &SubjectAttributes,
    ) -> Result<AttributeTable, DataAccessError> {
        Ok(self.get_attributes(subject_attributes).await?)
    }
}

#[async_trait]
impl CredentialDataAccessProvider for JsonCredentialProvider {
    async fn verify_password(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Option<AuthenticationAttributes>, DataAccessError> {
        Ok(self.verify_password(username, password).await?)
    }

    async fn update_password(&self, account: &AccountAttributes) -> Result<(), DataAccessError> {
        Ok(self.update_password(account).await?)
    }

    fn custom_query_verifies_password(&self) -> bool {
        self.custom_query_verifies_password()
    }
}
