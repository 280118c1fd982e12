//! Recognising proof statements in fetched text.

use crate::error::ParameterError;

/// Does `search_text` contain a statement linking it to `name`?
///
/// `name` must be fully qualified (`alice.id`). Names in the `.id`
/// namespace also accept the historical "bitcoin username" and "openname"
/// phrasings; everything else only accepts the "blockstack id" ones.
pub fn contains_valid_proof_statement(search_text: &str, name: &str) -> Result<bool, ParameterError> {
    if name.split('.').count() != 2 {
        return Err(ParameterError::new(
            "name",
            "must be a fully qualified name such as alice.id",
            name,
        ));
    }
    let text = search_text.to_lowercase();

    let mut styles = vec![
        format!("verifying that \"{name}\" is my blockstack id"),
        format!("verifying that {name} is my blockstack id"),
        format!("verifying that &quot;{name}&quot; is my blockstack id"),
    ];
    let username = name.strip_suffix(".id");
    if let Some(user) = username {
        styles.extend([
            format!("verifying myself: my bitcoin username is +{user}"),
            format!("verifying myself: my bitcoin username is {user}"),
            format!("verifying myself: my openname is {user}"),
            format!("verifying that +{user} is my bitcoin username"),
            format!("verifying that {user} is my bitcoin username"),
            format!("verifying that {user} is my openname"),
            format!("verifying that +{user} is my openname"),
            format!("verifying i am +{user} on my passcard"),
            format!("verifying that +{user} is my blockchain id"),
        ]);
    }

    if styles.iter().any(|style| text.contains(style.as_str())) {
        return Ok(true);
    }
    Ok(username.is_some_and(|user| {
        text.contains("verifymyonename") && text.contains(&format!("+{user}"))
    }))
}

/// Does `statement` say the name is secured by `address`?
///
/// Only the text before the first occurrence of the address is lowercased;
/// base58 addresses are case sensitive.
pub fn contains_valid_address_proof_statement(statement: &str, address: &str) -> bool {
    if address.is_empty() {
        return false;
    }
    let before = statement
        .find(address)
        .map_or(statement, |index| &statement[..index]);
    let normalized = format!("{}{address}", before.to_lowercase());
    normalized.contains(&format!(
        "verifying my blockstack id is secured with the address {address}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blockstack_id_phrasings() {
        for text in [
            "Verifying that \"alice.id\" is my Blockstack ID.",
            "verifying that alice.id is my blockstack id",
            "VERIFYING THAT &quot;alice.id&quot; IS MY BLOCKSTACK ID",
        ] {
            assert!(contains_valid_proof_statement(text, "alice.id").unwrap(), "{text}");
        }
    }

    #[test]
    fn test_legacy_phrasings_only_for_id_namespace() {
        let text = "Verifying myself: My Bitcoin username is +alice";
        assert!(contains_valid_proof_statement(text, "alice.id").unwrap());
        assert!(!contains_valid_proof_statement(text, "alice.btc").unwrap());
        assert!(contains_valid_proof_statement("verifymyonename +alice", "alice.id").unwrap());
        assert!(!contains_valid_proof_statement("verifymyonename", "alice.id").unwrap());
    }

    #[test]
    fn test_other_names_do_not_match() {
        let text = "verifying that bob.id is my blockstack id";
        assert!(!contains_valid_proof_statement(text, "alice.id").unwrap());
    }

    #[test]
    fn test_name_must_be_fully_qualified() {
        for name in ["alice", "a.b.id", ""] {
            let err = contains_valid_proof_statement("anything", name).unwrap_err();
            assert_eq!(err.parameter, "name");
        }
    }

    #[test]
    fn test_address_statement() {
        let address = "1NZNxhoxobqwsNvTb16pdeiqvFvce3Yg8U";
        let text = format!("Verifying my Blockstack ID is secured with the address {address}");
        assert!(contains_valid_address_proof_statement(&text, address));

        let lowered = text.to_lowercase();
        assert!(!contains_valid_address_proof_statement(&lowered, address));
        assert!(!contains_valid_address_proof_statement("unrelated", address));
        assert!(!contains_valid_address_proof_statement(&text, ""));
    }
}
