use crate::model::DuplicateKey;

#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    /// Raised only under `DuplicatePolicy::Reject`.
    #[error("{}", describe_duplicates(.0))]
    DuplicateKeys(Vec<DuplicateKey>),
}

fn describe_duplicates(dups: &[DuplicateKey]) -> String {
    let mut out = String::from("duplicate keys found:");
    for dup in dups {
        out.push_str(&format!(
            "\n  source {} key {:?} appears {} times",
            dup.origin, dup.key, dup.count
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Origin;

    #[test]
    fn duplicate_message_lists_every_key() {
        let err = ReconError::DuplicateKeys(vec![
            DuplicateKey {
                origin: Origin::A,
                key: "P1".into(),
                count: 2,
            },
            DuplicateKey {
                origin: Origin::B,
                key: "P7".into(),
                count: 3,
            },
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("duplicate keys found:"));
        assert!(msg.contains("source a key \"P1\" appears 2 times"));
        assert!(msg.contains("source b key \"P7\" appears 3 times"));
    }
}
