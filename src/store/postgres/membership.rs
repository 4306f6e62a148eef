//! `PostgreSQL` membership repository and role catalog.

use super::{
    PgPool, TxError, count, insert_effects,
    models::{MemberRow, NewMemberRow, RoleRow},
    notification::to_notification_row,
    run_blocking,
    schema::{project_members, projects, roles},
    violates,
};
use crate::membership::{
    domain::{Member, MemberId, PersistedMemberData, Role, RoleId, RoleName},
    ports::{
        MembershipRepository, MembershipRepositoryError, MembershipRepositoryResult, RoleCatalog,
    },
};
use crate::notification::domain::{Notification, NotificationId};
use crate::project::domain::ProjectId;
use crate::user::domain::UserId;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::io;
use uuid::Uuid;

type GuardResult<T> = Result<T, TxError<MembershipRepositoryError>>;

/// `PostgreSQL`-backed membership repository.
#[derive(Debug, Clone)]
pub struct PostgresMembershipRepository {
    pool: PgPool,
}

impl PostgresMembershipRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_where<F>(&self, query: F) -> MembershipRepositoryResult<Vec<Member>>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<Vec<MemberRow>> + Send + 'static,
    {
        run_blocking(&self.pool, move |connection| {
            query(connection)
                .map_err(MembershipRepositoryError::persistence)?
                .into_iter()
                .map(row_to_member)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl MembershipRepository for PostgresMembershipRepository {
    async fn store(&self, member: &Member) -> MembershipRepositoryResult<()> {
        let row = to_member_row(member);
        let member = member.clone();
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(project_members::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| enrollment_error(err, &member, None))?;
            Ok(())
        })
        .await
    }

    async fn enroll(
        &self,
        member: &Member,
        notice: &Notification,
    ) -> MembershipRepositoryResult<()> {
        let row = to_member_row(member);
        let notice_row = to_notification_row(notice);
        let (member, notice_id) = (member.clone(), notice.id());
        run_blocking(&self.pool, move |connection| {
            connection
                .transaction::<_, DieselError, _>(|tx| {
                    diesel::insert_into(project_members::table)
                        .values(&row)
                        .execute(tx)?;
                    insert_effects(tx, &[], std::slice::from_ref(&notice_row))
                })
                .map_err(|err| enrollment_error(err, &member, Some(notice_id)))
        })
        .await
    }

    async fn update(&self, member: &Member) -> MembershipRepositoryResult<()> {
        let row = to_member_row(member);
        let member_id = member.id();
        let keeps_admin = member.role() == RoleName::Admin;
        run_blocking(&self.pool, move |connection| {
            connection
                .transaction::<_, TxError<MembershipRepositoryError>, _>(|tx| {
                    let stored = lock_member(tx, member_id)?;
                    if !keeps_admin && is_last_admin(tx, &stored)? {
                        return Err(TxError::Rejected(MembershipRepositoryError::LastAdmin(
                            ProjectId::from_uuid(stored.project_id),
                        )));
                    }
                    diesel::update(project_members::table.find(row.id))
                        .set(&row)
                        .execute(tx)?;
                    Ok(())
                })
                .map_err(TxError::resolve)
        })
        .await
    }

    async fn find_by_id(&self, id: MemberId) -> MembershipRepositoryResult<Option<Member>> {
        run_blocking(&self.pool, move |connection| {
            project_members::table
                .find(id.into_inner())
                .select(MemberRow::as_select())
                .first(connection)
                .optional()
                .map_err(MembershipRepositoryError::persistence)?
                .map(row_to_member)
                .transpose()
        })
        .await
    }

    async fn find(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> MembershipRepositoryResult<Option<Member>> {
        run_blocking(&self.pool, move |connection| {
            project_members::table
                .filter(project_members::project_id.eq(project_id.into_inner()))
                .filter(project_members::user_id.eq(user_id.into_inner()))
                .select(MemberRow::as_select())
                .first(connection)
                .optional()
                .map_err(MembershipRepositoryError::persistence)?
                .map(row_to_member)
                .transpose()
        })
        .await
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> MembershipRepositoryResult<Vec<Member>> {
        self.load_where(move |connection| {
            project_members::table
                .filter(project_members::project_id.eq(project_id.into_inner()))
                .order((project_members::joined_at.asc(), project_members::id.asc()))
                .select(MemberRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_user(&self, user_id: UserId) -> MembershipRepositoryResult<Vec<Member>> {
        self.load_where(move |connection| {
            project_members::table
                .filter(project_members::user_id.eq(user_id.into_inner()))
                .order((project_members::joined_at.asc(), project_members::id.asc()))
                .select(MemberRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_role(&self, role: RoleName) -> MembershipRepositoryResult<Vec<Member>> {
        let role_id = role.id().value();
        self.load_where(move |connection| {
            project_members::table
                .filter(project_members::role_id.eq(role_id))
                .order((project_members::joined_at.asc(), project_members::id.asc()))
                .select(MemberRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_project_and_role(
        &self,
        project_id: ProjectId,
        role: RoleName,
    ) -> MembershipRepositoryResult<Vec<Member>> {
        let role_id = role.id().value();
        self.load_where(move |connection| {
            project_members::table
                .filter(project_members::project_id.eq(project_id.into_inner()))
                .filter(project_members::role_id.eq(role_id))
                .order((project_members::joined_at.asc(), project_members::id.asc()))
                .select(MemberRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn count_by_project(&self, project_id: ProjectId) -> MembershipRepositoryResult<u64> {
        run_blocking(&self.pool, move |connection| {
            project_members::table
                .filter(project_members::project_id.eq(project_id.into_inner()))
                .count()
                .get_result::<i64>(connection)
                .map(count)
                .map_err(MembershipRepositoryError::persistence)
        })
        .await
    }

    async fn delete(&self, id: MemberId) -> MembershipRepositoryResult<()> {
        run_blocking(&self.pool, move |connection| {
            connection
                .transaction::<_, TxError<MembershipRepositoryError>, _>(|tx| {
                    let stored = lock_member(tx, id)?;
                    if is_last_admin(tx, &stored)? {
                        return Err(TxError::Rejected(MembershipRepositoryError::LastAdmin(
                            ProjectId::from_uuid(stored.project_id),
                        )));
                    }
                    diesel::delete(project_members::table.find(id.into_inner())).execute(tx)?;
                    Ok(())
                })
                .map_err(TxError::resolve)
        })
        .await
    }
}

/// Maps an insert failure on `project_members` or `notifications`.
fn enrollment_error(
    err: DieselError,
    member: &Member,
    notice_id: Option<NotificationId>,
) -> MembershipRepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if violates(info.as_ref(), "project_members_project_user_key") =>
        {
            MembershipRepositoryError::AlreadyMember {
                project_id: member.project_id(),
                user_id: member.user_id(),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if info.table_name() == Some("project_members") =>
        {
            MembershipRepositoryError::DuplicateMember(member.id())
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => notice_id.map_or_else(
            || MembershipRepositoryError::persistence(err),
            MembershipRepositoryError::DuplicateNotification,
        ),
        _ => MembershipRepositoryError::persistence(err),
    }
}

/// Locks the member's project row, then loads the member.
///
/// Every guarded role change or removal in a project serializes on the
/// project row, so the admin count read afterwards cannot go stale.
fn lock_member(tx: &mut PgConnection, id: MemberId) -> GuardResult<MemberRow> {
    let project_id: Uuid = project_members::table
        .find(id.into_inner())
        .select(project_members::project_id)
        .first(tx)
        .optional()?
        .ok_or(TxError::Rejected(MembershipRepositoryError::NotFound(id)))?;
    projects::table
        .find(project_id)
        .select(projects::id)
        .for_update()
        .first::<Uuid>(tx)?;
    project_members::table
        .find(id.into_inner())
        .select(MemberRow::as_select())
        .first(tx)
        .optional()?
        .ok_or(TxError::Rejected(MembershipRepositoryError::NotFound(id)))
}

/// Returns `true` when `stored` is the only `ADMIN` of its project.
fn is_last_admin(tx: &mut PgConnection, stored: &MemberRow) -> QueryResult<bool> {
    let admin = RoleName::Admin.id().value();
    if stored.role_id != admin {
        return Ok(false);
    }
    let other_admins = project_members::table
        .filter(project_members::project_id.eq(stored.project_id))
        .filter(project_members::role_id.eq(admin))
        .filter(project_members::id.ne(stored.id))
        .count()
        .get_result::<i64>(tx)?;
    Ok(other_admins == 0)
}

/// `PostgreSQL`-backed view of the seeded role catalog.
#[derive(Debug, Clone)]
pub struct PostgresRoleCatalog {
    pool: PgPool,
}

impl PostgresRoleCatalog {
    /// Creates a catalog reader from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleCatalog for PostgresRoleCatalog {
    async fn list_roles(&self) -> MembershipRepositoryResult<Vec<Role>> {
        run_blocking(&self.pool, move |connection| {
            roles::table
                .order(roles::id.asc())
                .select(RoleRow::as_select())
                .load(connection)
                .map_err(MembershipRepositoryError::persistence)?
                .into_iter()
                .map(row_to_role)
                .collect()
        })
        .await
    }

    async fn find_role_by_name(&self, name: RoleName) -> MembershipRepositoryResult<Option<Role>> {
        run_blocking(&self.pool, move |connection| {
            roles::table
                .filter(roles::name.eq(name.as_str()))
                .select(RoleRow::as_select())
                .first(connection)
                .optional()
                .map_err(MembershipRepositoryError::persistence)?
                .map(row_to_role)
                .transpose()
        })
        .await
    }

    async fn find_role_by_id(&self, id: RoleId) -> MembershipRepositoryResult<Option<Role>> {
        run_blocking(&self.pool, move |connection| {
            roles::table
                .find(id.value())
                .select(RoleRow::as_select())
                .first(connection)
                .optional()
                .map_err(MembershipRepositoryError::persistence)?
                .map(row_to_role)
                .transpose()
        })
        .await
    }
}

pub(super) fn to_member_row(member: &Member) -> NewMemberRow {
    NewMemberRow {
        id: member.id().into_inner(),
        project_id: member.project_id().into_inner(),
        user_id: member.user_id().into_inner(),
        role_id: member.role_id().value(),
        joined_at: member.joined_at(),
    }
}

fn row_to_member(row: MemberRow) -> MembershipRepositoryResult<Member> {
    let MemberRow {
        id,
        project_id,
        user_id,
        role_id,
        joined_at,
    } = row;
    let role =
        RoleName::from_id(RoleId::new(role_id)).map_err(MembershipRepositoryError::persistence)?;
    Ok(Member::from_persisted(PersistedMemberData {
        id: MemberId::from_uuid(id),
        project_id: ProjectId::from_uuid(project_id),
        user_id: UserId::from_uuid(user_id),
        role,
        joined_at,
    }))
}

/// Rebuilds a catalog entry, rejecting rows that disagree with the seed.
fn row_to_role(row: RoleRow) -> MembershipRepositoryResult<Role> {
    let name =
        RoleName::try_from(row.name.as_str()).map_err(MembershipRepositoryError::persistence)?;
    let role = Role::seeded(name);
    if role.id().value() != row.id {
        return Err(MembershipRepositoryError::persistence(io::Error::other(
            format!("role {name} stored with id {} instead of {}", row.id, role.id().value()),
        )));
    }
    Ok(role)
}
