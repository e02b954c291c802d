//! Client-side id generation for documents and files.

/// Maximum id length accepted by the backend is 36; ids are kept shorter.
const ID_LEN: usize = 20;

/// Generate a fresh id: lowercase hex, starting with an alphanumeric.
pub fn unique_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(ID_LEN);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_unique_id_shape() {
        let id = unique_id();
        assert_eq!(id.len(), ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_unique_ids_differ() {
        let ids: HashSet<String> = (0..1000).map(|_| unique_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
