use uuid::Uuid;

/// Generates a unique id such as `LogisticRegression_4d8b1f2c09ae`.
pub fn random_uid(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &id[id.len() - 12..])
}
