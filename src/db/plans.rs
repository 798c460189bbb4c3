// src/db/plans.rs
use crate::errors::ServerError;
use rusqlite::{params, Connection};

pub const DEFAULT_PLAN: &str = "free";

#[derive(Debug, Clone)]
pub struct PlanInfo {
    pub code: String,
    pub name: String,
    /// `None` means unlimited saved alerts.
    pub alert_limit: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct UserWithPlan {
    pub id: i64,
    pub email: String,
    pub is_moderator: bool,
    pub plan_code: Option<String>,
    pub alert_count: i64,
    pub last_login_at: Option<i64>,
}

/// Ensure a user has an entitlement row (one per user) pointing at a plan code.
pub fn ensure_entitlement(
    conn: &Connection,
    user_id: i64,
    plan_code: &str,
    now: i64,
) -> Result<(), ServerError> {
    conn.execute(
        "insert or ignore into entitlements (user_id, plan_code, granted_at) values (?, ?, ?)",
        params![user_id, plan_code, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert entitlement failed: {e}")))?;
    Ok(())
}

pub fn get_user_plan(conn: &Connection, user_id: i64) -> Result<PlanInfo, ServerError> {
    conn.query_row(
        r#"
        select p.code, p.name, p.alert_limit
        from entitlements e
        join plans p on p.code = e.plan_code
        where e.user_id = ?
        "#,
        params![user_id],
        |row| {
            Ok(PlanInfo {
                code: row.get(0)?,
                name: row.get(1)?,
                alert_limit: row.get(2)?,
            })
        },
    )
    .map_err(|e| ServerError::DbError(format!("failed to load user plan: {e}")))
}

pub fn list_plans(conn: &Connection) -> Result<Vec<PlanInfo>, ServerError> {
    let mut stmt = conn
        .prepare("select code, name, alert_limit from plans order by id")
        .map_err(|e| ServerError::DbError(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PlanInfo {
                code: row.get(0)?,
                name: row.get(1)?,
                alert_limit: row.get(2)?,
            })
        })
        .map_err(|e| ServerError::DbError(format!("list plans failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

/// Switch a user's plan. Stands in for the checkout provider's webhook.
pub fn set_user_plan(
    conn: &Connection,
    user_id: i64,
    plan_code: &str,
    now: i64,
) -> Result<(), ServerError> {
    let known: i64 = conn
        .query_row(
            "select count(*) from plans where code = ?",
            params![plan_code],
            |r| r.get(0),
        )
        .map_err(|e| ServerError::DbError(format!("select plan failed: {e}")))?;
    if known == 0 {
        return Err(ServerError::validation("plan", format!("unknown plan '{plan_code}'")));
    }

    if crate::db::auth::get_user(conn, user_id)?.is_none() {
        return Err(ServerError::not_found(format!("user {user_id}")));
    }

    conn.execute(
        r#"
        insert into entitlements (user_id, plan_code, granted_at) values (?1, ?2, ?3)
        on conflict(user_id) do update set plan_code = excluded.plan_code, granted_at = excluded.granted_at
        "#,
        params![user_id, plan_code, now],
    )
    .map_err(|e| ServerError::DbError(format!("set plan failed: {e}")))?;
    Ok(())
}

pub fn list_users_with_plans(conn: &Connection) -> Result<Vec<UserWithPlan>, ServerError> {
    let mut stmt = conn
        .prepare(
            r#"
            select u.id, u.email, u.is_moderator, e.plan_code,
                   (select count(*) from alerts a where a.user_id = u.id),
                   u.last_login_at
            from users u
            left join entitlements e on e.user_id = u.id
            order by u.id
            "#,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map([], |r| {
            Ok(UserWithPlan {
                id: r.get(0)?,
                email: r.get(1)?,
                is_moderator: r.get(2)?,
                plan_code: r.get(3)?,
                alert_count: r.get(4)?,
                last_login_at: r.get(5)?,
            })
        })
        .map_err(|e| ServerError::DbError(format!("list users failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}
