use actix_web::{web, HttpResponse};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::errors::ApiResult;
use crate::models::group::Group;
use crate::models::permission::Permission;

#[derive(Serialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    pub permissions: Vec<String>,
}

// every group with the permission names it grants
pub async fn list_groups(
    pool: web::Data<SqlitePool>,
    _current: CurrentUser,
) -> ApiResult<HttpResponse> {
    let mut groups = Vec::new();
    for group in Group::list_all(pool.get_ref()).await? {
        let permissions = Permission::list_for_group(pool.get_ref(), group.id)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();
        groups.push(GroupDetail { group, permissions });
    }
    Ok(HttpResponse::Ok().json(groups))
}
