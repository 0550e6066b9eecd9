//! Depth-first traversal of the cart object tree.
//!
//! The tree owns its children by value, so a walk always terminates; the
//! depth bound only protects the call stack against pathological input.

use crate::cart::{Attachment, Cart, Model};

/// Callbacks invoked by [`walk_cart`].
///
/// `path` lists attachment names from the root model down to the node being
/// visited.
pub trait CartVisitor {
    fn visit_model(&mut self, _model: &Model) {}

    fn visit_attachment(&mut self, _path: &[&str], _attachment: &Attachment) {}

    /// Called instead of descending into a node deeper than the bound.
    fn depth_exceeded(&mut self, _path: &[&str]) {}
}

/// Walk `cart` depth-first, visiting the root model and then every
/// attachment. Nodes deeper than `max_depth` (the root model's direct
/// children are at depth 1) are reported and skipped along with their
/// subtrees.
pub fn walk_cart<V: CartVisitor + ?Sized>(cart: &Cart, visitor: &mut V, max_depth: usize) {
    let Some(model) = &cart.model else {
        return;
    };
    visitor.visit_model(model);

    let mut path = Vec::new();
    for (name, child) in &model.attachments {
        walk_attachment(name, child, 1, &mut path, visitor, max_depth);
    }
}

fn walk_attachment<'a, V: CartVisitor + ?Sized>(
    name: &'a str,
    attachment: &'a Attachment,
    depth: usize,
    path: &mut Vec<&'a str>,
    visitor: &mut V,
    max_depth: usize,
) {
    path.push(name);
    if depth > max_depth {
        visitor.depth_exceeded(path);
    } else {
        visitor.visit_attachment(path, attachment);
        for (child_name, child) in &attachment.attachments {
            walk_attachment(child_name, child, depth + 1, path, visitor, max_depth);
        }
    }
    path.pop();
}
