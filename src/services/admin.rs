//! Admin account management
//!
//! Listing and moderating other administrators. Accounts are created through
//! signup, never here.

use chrono::Utc;
use std::sync::Arc;

use super::validation::require;
use super::{ServiceError, ServiceResult};
use crate::db::repositories::AdminRepository;
use crate::models::{Admin, AdminRole, ListParams, PagedResult, UpdateAdminInput};

pub struct AdminService {
    repo: Arc<dyn AdminRepository>,
}

impl AdminService {
    pub fn new(repo: Arc<dyn AdminRepository>) -> Self {
        Self { repo }
    }

    /// List admins; `status` filters by role
    pub async fn list(&self, params: ListParams) -> ServiceResult<PagedResult<Admin>> {
        Ok(self.repo.list(&params.normalized()).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Admin> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Admin"))
    }

    /// Change another admin's name, role or approval
    pub async fn update(
        &self,
        actor: &Admin,
        id: i64,
        input: UpdateAdminInput,
    ) -> ServiceResult<Admin> {
        if actor.id == id {
            return Err(ServiceError::Forbidden(
                "You cannot modify your own account here".to_string(),
            ));
        }
        let mut admin = self.get(id).await?;
        ensure_may_manage(actor, &admin)?;

        if let Some(role) = input.role {
            if role != admin.role {
                if !actor.is_super_admin() {
                    return Err(ServiceError::Forbidden(
                        "Only a super admin can change roles".to_string(),
                    ));
                }
                if admin.is_super_admin() {
                    self.ensure_other_super_admin().await?;
                }
                admin.role = role;
            }
        }
        if let Some(name) = input.name {
            require("Name", &name)?;
            admin.name = name.trim().to_string();
        }
        if let Some(is_approved) = input.is_approved {
            admin.is_approved = is_approved;
        }
        admin.updated_at = Utc::now();

        let admin = self.repo.update(&admin).await?;
        tracing::info!(actor_id = actor.id, admin_id = admin.id, role = %admin.role, approved = admin.is_approved, "Admin updated");
        Ok(admin)
    }

    pub async fn delete(&self, actor: &Admin, id: i64) -> ServiceResult<()> {
        if actor.id == id {
            return Err(ServiceError::Forbidden(
                "You cannot delete your own account".to_string(),
            ));
        }
        let admin = self.get(id).await?;
        ensure_may_manage(actor, &admin)?;
        if admin.is_super_admin() {
            self.ensure_other_super_admin().await?;
        }

        if !self.repo.delete(id).await? {
            return Err(ServiceError::NotFound("Admin"));
        }
        tracing::info!(actor_id = actor.id, admin_id = id, "Admin deleted");
        Ok(())
    }

    async fn ensure_other_super_admin(&self) -> ServiceResult<()> {
        if self.repo.count_by_role(AdminRole::SuperAdmin).await? <= 1 {
            return Err(ServiceError::Conflict(
                "At least one super admin must remain".to_string(),
            ));
        }
        Ok(())
    }
}

/// Only a super admin may edit, un-approve or delete another super admin
fn ensure_may_manage(actor: &Admin, target: &Admin) -> ServiceResult<()> {
    if target.is_super_admin() && !actor.is_super_admin() {
        return Err(ServiceError::Forbidden(
            "Only a super admin can manage a super admin".to_string(),
        ));
    }
    Ok(())
}
