use color_eyre::Result;

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS admin (
        id INTEGER PRIMARY KEY,
        password_hash TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS admin_sessions (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        whatsapp_number TEXT NOT NULL,
        gender TEXT NOT NULL,
        age INTEGER NOT NULL,
        grade TEXT NOT NULL,
        school_name TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        language TEXT NOT NULL,
        last_login_at TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS members (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        position INTEGER NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL,
        whatsapp_number TEXT NOT NULL,
        gender TEXT NOT NULL,
        age INTEGER NOT NULL,
        grade TEXT NOT NULL,
        school_name TEXT NOT NULL,
        UNIQUE(user_id, position)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_sessions (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS quiz_questions (
        id INTEGER PRIMARY KEY,
        question TEXT NOT NULL,
        options TEXT NOT NULL,
        correct_answer INTEGER NOT NULL,
        language TEXT NOT NULL,
        school_name TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS case_questions (
        id INTEGER PRIMARY KEY,
        question TEXT NOT NULL,
        options TEXT NOT NULL,
        correct_answer INTEGER NOT NULL,
        language TEXT NOT NULL,
        school_name TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    // One quiz attempt per (user, language); the index is what closes the
    // double-submit race.
    r#"
    CREATE TABLE IF NOT EXISTS quiz_attempts (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        question_ids TEXT NOT NULL,
        answers TEXT NOT NULL,
        score INTEGER NOT NULL,
        language TEXT NOT NULL,
        school_name TEXT,
        time_taken INTEGER,
        submitted_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE(user_id, language)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS case_attempts (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        question_ids TEXT NOT NULL,
        answers TEXT NOT NULL,
        score INTEGER NOT NULL,
        language TEXT NOT NULL,
        school_name TEXT,
        time_taken INTEGER,
        submitted_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE(user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attempt_drafts (
        user_id INTEGER NOT NULL,
        assessment TEXT NOT NULL,
        gate_language TEXT NOT NULL,
        question_ids TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY(user_id, assessment, gate_language)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS videos (
        type TEXT PRIMARY KEY,
        url TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS video_watches (
        user_id INTEGER NOT NULL,
        type TEXT NOT NULL,
        watched_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY(user_id, type)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_quiz_attempts_school ON quiz_attempts(school_name)",
    "CREATE INDEX IF NOT EXISTS idx_case_attempts_school ON case_attempts(school_name)",
    "CREATE INDEX IF NOT EXISTS idx_quiz_questions_language ON quiz_questions(language)",
    "CREATE INDEX IF NOT EXISTS idx_case_questions_language ON case_questions(language)",
    "CREATE INDEX IF NOT EXISTS idx_users_school ON users(school_name)",
];

pub async fn create_schema(conn: &libsql::Connection) -> Result<()> {
    for sql in TABLES {
        conn.execute(sql, ()).await?;
    }

    Ok(())
}
