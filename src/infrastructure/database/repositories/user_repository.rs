use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::db_err;
use crate::domain::{
    DomainError, DomainResult, GetUserDto, UpdateUserDto, UpsertUserDto, User, UserRepository,
    UserRole,
};
use crate::infrastructure::database::entities::user;
use crate::shared::PaginatedResult;

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn entity_role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::SuperAdmin => UserRole::SuperAdmin,
        user::UserRole::Teacher => UserRole::Teacher,
        user::UserRole::Student => UserRole::Student,
    }
}

pub(crate) fn domain_role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::SuperAdmin => user::UserRole::SuperAdmin,
        UserRole::Teacher => user::UserRole::Teacher,
        UserRole::Student => user::UserRole::Student,
    }
}

fn user_model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        email: model.email,
        first_name: model.first_name,
        last_name: model.last_name,
        profile_image_url: model.profile_image_url,
        role: entity_role_to_domain(model.role),
        is_active: model.is_active,
        last_login_at: model.last_login_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn upsert_user(&self, dto: UpsertUserDto) -> DomainResult<User> {
        let now = Utc::now();
        let id = dto.id.clone();

        let model = user::ActiveModel {
            id: Set(dto.id),
            email: Set(dto.email),
            first_name: Set(dto.first_name),
            last_name: Set(dto.last_name),
            profile_image_url: Set(dto.profile_image_url),
            role: Set(user::UserRole::Student),
            is_active: Set(true),
            last_login_at: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // role and is_active are deliberately absent from the update list
        user::Entity::insert(model)
            .on_conflict(
                OnConflict::column(user::Column::Id)
                    .update_columns([
                        user::Column::Email,
                        user::Column::FirstName,
                        user::Column::LastName,
                        user::Column::ProfileImageUrl,
                        user::Column::LastLoginAt,
                        user::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(db_err)?;

        self.get_user_by_id(&id)
            .await?
            .ok_or_else(|| DomainError::Storage(format!("User {} vanished after upsert", id)))
    }

    async fn list_users(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        let page = dto.page.unwrap_or(1).max(1);
        let page_size = dto.page_size.unwrap_or(20).clamp(1, 100);

        let mut query = user::Entity::find();

        // Search email and names, case-insensitively
        if let Some(ref search) = dto.search {
            let needle = format!("%{}%", search.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(user::Column::Email))).like(needle.clone()))
                    .add(Expr::expr(Func::lower(Expr::col(user::Column::FirstName))).like(needle.clone()))
                    .add(Expr::expr(Func::lower(Expr::col(user::Column::LastName))).like(needle)),
            );
        }

        if let Some(role) = dto.role {
            query = query.filter(user::Column::Role.eq(domain_role_to_entity(role)));
        }

        match dto.sort_by.as_deref() {
            Some("email") => {
                query = query.order_by_asc(user::Column::Email);
            }
            Some("last_name") => {
                query = query.order_by_asc(user::Column::LastName);
            }
            Some("role") => {
                query = query.order_by_asc(user::Column::Role);
            }
            _ => {
                query = query.order_by_desc(user::Column::CreatedAt);
            }
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;

        let offset = ((page - 1) * page_size) as u64;
        let models = query
            .offset(offset)
            .limit(page_size as u64)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let items: Vec<User> = models.into_iter().map(user_model_to_domain).collect();

        Ok(PaginatedResult::new(items, total, page, page_size))
    }

    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn update_user(&self, id: &str, dto: UpdateUserDto) -> DomainResult<Option<User>> {
        let existing = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let mut active: user::ActiveModel = existing.into();

        if let Some(first_name) = dto.first_name {
            active.first_name = Set(Some(first_name));
        }
        if let Some(last_name) = dto.last_name {
            active.last_name = Set(Some(last_name));
        }
        if let Some(role) = dto.role {
            active.role = Set(domain_role_to_entity(role));
        }
        if let Some(is_active) = dto.is_active {
            active.is_active = Set(is_active);
        }

        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await.map_err(db_err)?;

        Ok(Some(user_model_to_domain(updated)))
    }

    async fn delete_user(&self, id: &str) -> DomainResult<()> {
        let result = user::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("User", "id", id));
        }

        Ok(())
    }
}
