//! Structural diff between two canonical tree renderings.
//!
//! Operates on the id-less XML so that opaque-id renumbering between the
//! before and after snapshots never shows up as a change. The output is a
//! plain line diff (`-` removed, `+` added, two lines of context) that the
//! changes analyzer summarizes.

use similar::{ChangeTag, TextDiff};

pub fn compute(before: &str, after: &str) -> String {
    let diff = TextDiff::from_lines(before, after);
    let mut out = String::new();

    for (index, group) in diff.grouped_ops(2).iter().enumerate() {
        if index > 0 {
            out.push_str("...\n");
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => "- ",
                    ChangeTag::Insert => "+ ",
                    ChangeTag::Equal => "  ",
                };
                out.push_str(sign);
                out.push_str(change.value());
                if !change.value().ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_trees_produce_empty_diff() {
        let xml = "<root>\n  <button name=\"Go\" />\n</root>\n";
        assert_eq!(compute(xml, xml), "");
    }

    #[test]
    fn attribute_change_shows_as_remove_and_add() {
        let before = "<root>\n  <button name=\"Click me\" />\n</root>\n";
        let after = "<root>\n  <button name=\"Submit\" />\n</root>\n";
        let diff = compute(before, after);
        assert!(diff.contains("- "));
        assert!(diff.contains("+ "));
        assert!(diff.contains("Click me"));
        assert!(diff.contains("Submit"));
    }

    #[test]
    fn added_nodes_are_reported_in_order() {
        let before = "<list>\n  <item name=\"a\" />\n</list>\n";
        let after = "<list>\n  <item name=\"a\" />\n  <item name=\"b\" />\n</list>\n";
        let diff = compute(before, after);
        let added: Vec<&str> = diff.lines().filter(|l| l.starts_with("+ ")).collect();
        assert_eq!(added.len(), 1);
        assert!(added[0].contains("name=\"b\""));
    }

    #[test]
    fn distant_changes_are_separated() {
        let mut before = String::from("<root>\n");
        for i in 0..20 {
            before.push_str(&format!("  <item name=\"{i}\" />\n"));
        }
        before.push_str("</root>\n");
        let after = before
            .replace("name=\"0\"", "name=\"zero\"")
            .replace("name=\"19\"", "name=\"nineteen\"");
        let diff = compute(&before, &after);
        assert!(diff.contains("...\n"));
    }
}
