mod diagnostics;
mod discovery;
mod schema_rules;
