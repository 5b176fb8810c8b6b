use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    create_employees_table(pool).await?;
    create_attendance_sessions_table(pool).await?;
    create_leave_requests_table(pool).await?;
    create_messages_table(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}

async fn create_employees_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('admin', 'employee')),
            schedule_start TEXT,
            schedule_end TEXT,
            working_days TEXT,
            hours_per_day REAL,
            hours_per_week REAL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_attendance_sessions_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance_sessions (
            id INTEGER PRIMARY KEY,
            employee_id TEXT NOT NULL,
            check_in_time DATETIME NOT NULL,
            check_out_time DATETIME,
            duration_minutes INTEGER,
            date DATE NOT NULL,
            latitude REAL,
            longitude REAL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (employee_id) REFERENCES employees (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // At most one open session per employee, including concurrent
    // check-ins from separate devices.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_attendance_one_open_session
        ON attendance_sessions (employee_id)
        WHERE check_out_time IS NULL
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_leave_requests_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leave_requests (
            id INTEGER PRIMARY KEY,
            employee_id TEXT NOT NULL,
            leave_type TEXT NOT NULL CHECK (leave_type IN ('annual', 'sick', 'unpaid')),
            start_date DATE NOT NULL,
            end_date DATE NOT NULL,
            reason TEXT,
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'approved', 'rejected')),
            reviewed_by TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (employee_id) REFERENCES employees (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_messages_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY,
            sender_id TEXT NOT NULL,
            recipient_id TEXT NOT NULL,
            body TEXT NOT NULL,
            is_read BOOLEAN DEFAULT FALSE,
            sent_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
