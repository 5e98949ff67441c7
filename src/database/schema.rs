// PostgreSQL schema, applied in order inside one transaction.
// Every statement is safe to re-run.

pub const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username VARCHAR(50) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        role VARCHAR(16) NOT NULL CHECK (role IN ('admin', 'editor', 'user'))
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "position" (id BIGSERIAL PRIMARY KEY, name VARCHAR(45) NOT NULL)"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS position_name_lower_key ON "position" (LOWER(name))"#,
    r#"CREATE TABLE IF NOT EXISTS prof (id BIGSERIAL PRIMARY KEY, name VARCHAR(45) NOT NULL)"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS prof_name_lower_key ON prof (LOWER(name))"#,
    r#"CREATE TABLE IF NOT EXISTS education (id BIGSERIAL PRIMARY KEY, name VARCHAR(45) NOT NULL)"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS education_name_lower_key ON education (LOWER(name))"#,
    r#"CREATE TABLE IF NOT EXISTS gender (id BIGSERIAL PRIMARY KEY, name VARCHAR(45) NOT NULL)"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS gender_name_lower_key ON gender (LOWER(name))"#,
    r#"CREATE TABLE IF NOT EXISTS actions (id BIGSERIAL PRIMARY KEY, name VARCHAR(45) NOT NULL)"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS actions_name_lower_key ON actions (LOWER(name))"#,
    r#"CREATE TABLE IF NOT EXISTS workers (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(45) NOT NULL,
        fam VARCHAR(45) NOT NULL,
        otch VARCHAR(45),
        gender_id BIGINT REFERENCES gender (id),
        prof_id BIGINT REFERENCES prof (id),
        position_id BIGINT REFERENCES "position" (id),
        education_id BIGINT REFERENCES education (id),
        salary NUMERIC(12, 2) NOT NULL DEFAULT 0 CHECK (salary >= 0),
        date_r DATE,
        date_hired DATE,
        date_fired DATE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS list (
        id BIGSERIAL PRIMARY KEY,
        workers_id BIGINT NOT NULL REFERENCES workers (id),
        actions_id BIGINT NOT NULL REFERENCES actions (id),
        "sum" NUMERIC(12, 2) NOT NULL CHECK ("sum" >= 0),
        "date" DATE NOT NULL DEFAULT CURRENT_DATE
    )"#,
    r#"CREATE INDEX IF NOT EXISTS list_date_idx ON list ("date" DESC, id DESC)"#,
];
