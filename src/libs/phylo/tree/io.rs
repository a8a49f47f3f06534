use super::Tree;
use crate::libs::phylo::node::NodeId;
use std::io::Read;

/// Read all Newick trees from a file ("stdin" reads standard input).
pub fn from_file(infile: &str) -> anyhow::Result<Vec<Tree>> {
    let mut reader = intspan::reader(infile);
    let mut newick = String::new();
    reader
        .read_to_string(&mut newick)
        .map_err(|e| anyhow::anyhow!("Read error on {}: {}", infile, e))?;
    Ok(Tree::from_newick_multi(newick.as_str())?)
}

/// Serialize tree to a single-line Newick string.
pub fn to_newick(tree: &Tree) -> String {
    match tree.get_root() {
        Some(root) => {
            let mut s = String::new();
            write_subtree(tree, root, &mut s);
            s.push(';');
            s
        }
        None => ";".to_string(),
    }
}

fn write_subtree(tree: &Tree, node_id: NodeId, out: &mut String) {
    let node = &tree.nodes[node_id];

    if !node.children.is_empty() {
        out.push('(');
        for (i, &child) in node.children.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_subtree(tree, child, out);
        }
        out.push(')');
    }

    if let Some(name) = &node.name {
        out.push_str(&quote_label(name));
    }
    if let Some(len) = node.length {
        out.push_str(&format!(":{}", len));
    }
}

fn quote_label(label: &str) -> String {
    let needs_quote = label.chars().any(|c| "(),:;[] \t\n".contains(c));
    if needs_quote {
        format!("'{}'", label)
    } else {
        label.to_string()
    }
}
