use crate::config::DEFAULT_RESOURCE_LABEL;

/// Alert text naming the other editors of a page, `None` when there are
/// none.
pub fn compose_presence_message<S: AsRef<str>>(names: &[S]) -> Option<String> {
    compose_presence_message_for(names, DEFAULT_RESOURCE_LABEL)
}

/// Same as [`compose_presence_message`] with a custom resource label, e.g.
/// "document" for "Ann is currently editing this document".
pub fn compose_presence_message_for<S: AsRef<str>>(names: &[S], label: &str) -> Option<String> {
    match names {
        [] => None,
        [only] => Some(format!("{} is currently editing this {}", only.as_ref(), label)),
        [rest @ .., last] => {
            let head = rest.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ");
            Some(format!(
                "{} and {} are currently editing this {}",
                head,
                last.as_ref(),
                label
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_editors() {
        let names: [&str; 0] = [];
        assert_eq!(compose_presence_message(&names), None);
    }

    #[test]
    fn test_single_editor() {
        assert_eq!(
            compose_presence_message(&["Ann"]).as_deref(),
            Some("Ann is currently editing this page")
        );
    }

    #[test]
    fn test_two_editors() {
        assert_eq!(
            compose_presence_message(&["Ann", "Bo"]).as_deref(),
            Some("Ann and Bo are currently editing this page")
        );
    }

    #[test]
    fn test_many_editors() {
        assert_eq!(
            compose_presence_message(&["Ann", "Bo", "Cy"]).as_deref(),
            Some("Ann, Bo and Cy are currently editing this page")
        );
        assert_eq!(
            compose_presence_message(&["Ann", "Bo", "Cy", "Di"]).as_deref(),
            Some("Ann, Bo, Cy and Di are currently editing this page")
        );
    }

    #[test]
    fn test_custom_label() {
        let names = vec!["Ann Lee".to_string()];
        assert_eq!(
            compose_presence_message_for(&names, "document").as_deref(),
            Some("Ann Lee is currently editing this document")
        );
    }
}
