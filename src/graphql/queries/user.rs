use super::prelude::*;

#[derive(Default)]
pub struct UserQueries;

#[Object]
impl UserQueries {
    /// The signed-in user
    async fn user(&self, ctx: &Context<'_>) -> Result<User> {
        let user = current_user(ctx).await.gql()?;
        Ok(User::from(user))
    }
}
