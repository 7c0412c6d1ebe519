use reflgen::meta::{Artifact, MemberDescriptor, TypeDescriptor};

/// Parse a JSON artifact
pub fn parse_artifact(json: &str) -> Artifact {
    serde_json::from_str(json).expect("Expected a valid JSON artifact")
}

/// Assert the artifact contains a type with the given qualified name
pub fn assert_has_type<'a>(artifact: &'a Artifact, name: &str) -> &'a TypeDescriptor {
    artifact
        .get(name)
        .unwrap_or_else(|| panic!("Expected type with qualified name: {}", name))
}

/// Names of members, in order
pub fn member_names(members: &[MemberDescriptor]) -> Vec<&str> {
    members.iter().map(|m| m.name.as_str()).collect()
}

/// `(key, value)` pairs of a member's metadata, in order
pub fn meta_pairs(member: &MemberDescriptor) -> Vec<(&str, &str)> {
    member
        .meta
        .iter()
        .map(|p| (p.key.as_str(), p.value.as_str()))
        .collect()
}
