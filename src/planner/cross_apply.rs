use crate::schema::{ElementKind, ResolvedPath, TypeNode};
use std::collections::BTreeMap;
use tracing::trace;

/// One array expansion (`CROSS APPLY` / lateral join)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossApplyNode {
    /// Dotted declared names from the document root through the array segment
    pub key: String,
    /// SQL alias; equal to the key so it is unique within a query
    pub alias: String,
    pub parent: Option<usize>,
    /// Segments from the parent's element (or the document root) to the array
    pub json_pointer: Vec<String>,
    pub requires_group_by: bool,
}

/// Where a resolved path's value lives once the joins are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    /// Innermost join the path reads through; `None` reads the document root
    pub join: Option<usize>,
    /// Segments below the join element (or the root) up to and including the terminal
    pub suffix: Vec<String>,
    pub terminal: TypeNode,
}

/// Join tree shared by every path in one query, stored as an arena
#[derive(Debug, Default, Clone)]
pub struct CrossApplyPlan {
    nodes: Vec<CrossApplyNode>,
    by_key: BTreeMap<String, usize>,
}

impl CrossApplyPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every array crossing of `path` and return its binding.
    ///
    /// Joins already seen under the same key are reused. Joins reached by a
    /// sort key are flagged so the emitter can fold duplicates with GROUP BY.
    pub fn add(&mut self, path: &ResolvedPath, from_sort: bool) -> FieldBinding {
        let mut join: Option<usize> = None;
        let mut segment_start = 0;

        for (idx, node) in path.array_crossings() {
            let key = path.prefix_key(idx);
            let pointer: Vec<String> = path.nodes()[segment_start..=idx]
                .iter()
                .map(|n| n.name.clone())
                .collect();

            let id = match self.by_key.get(&key) {
                Some(&existing) => existing,
                None => self.push(key, join, pointer),
            };
            if from_sort {
                self.nodes[id].requires_group_by = true;
            }

            debug_assert_eq!(node.element_kind, ElementKind::ObjectArray);
            join = Some(id);
            segment_start = idx + 1;
        }

        FieldBinding {
            join,
            suffix: path.nodes()[segment_start..]
                .iter()
                .map(|n| n.name.clone())
                .collect(),
            terminal: path.terminal().clone(),
        }
    }

    fn push(&mut self, key: String, parent: Option<usize>, json_pointer: Vec<String>) -> usize {
        if let Some(parent) = parent {
            debug_assert!(
                key.starts_with(&format!("{}.", self.nodes[parent].key)),
                "join '{}' does not extend its parent '{}'",
                key,
                self.nodes[parent].key
            );
        }

        let id = self.nodes.len();
        trace!(key = %key, ?parent, "planned array join");
        self.by_key.insert(key.clone(), id);
        self.nodes.push(CrossApplyNode {
            alias: key.clone(),
            key,
            parent,
            json_pointer,
            requires_group_by: false,
        });
        id
    }

    pub fn node(&self, id: usize) -> &CrossApplyNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn requires_group_by(&self) -> bool {
        self.nodes.iter().any(|n| n.requires_group_by)
    }

    /// Emission order: depth first, siblings by key, parents before children
    pub fn ordered(&self) -> Vec<&CrossApplyNode> {
        let mut children: BTreeMap<Option<usize>, Vec<usize>> = BTreeMap::new();
        // by_key iterates in key order, so every sibling list is already sorted
        for &id in self.by_key.values() {
            children.entry(self.nodes[id].parent).or_default().push(id);
        }

        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = children.get(&None).cloned().unwrap_or_default();
        stack.reverse();

        while let Some(id) = stack.pop() {
            out.push(&self.nodes[id]);
            if let Some(kids) = children.get(&Some(id)) {
                stack.extend(kids.iter().rev().copied());
            }
        }

        debug_assert_eq!(out.len(), self.nodes.len());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, ObjectType, Schema, resolve};

    fn schema() -> Schema {
        Schema::builder("Post")
            .object(
                ObjectType::new("Post")
                    .field("Title", FieldType::string())
                    .field("Tags", FieldType::array(FieldType::string()))
                    .field("Meta", FieldType::object("Meta"))
                    .field("Comments", FieldType::array(FieldType::object("Comment"))),
            )
            .object(ObjectType::new("Meta").field("Links", FieldType::array(FieldType::object("Link"))))
            .object(ObjectType::new("Link").field("Href", FieldType::string()))
            .object(
                ObjectType::new("Comment")
                    .field("Content", FieldType::string())
                    .field("Author", FieldType::object("User"))
                    .field("Replies", FieldType::array(FieldType::object("Comment"))),
            )
            .object(ObjectType::new("User").field("Username", FieldType::string()))
            .build()
            .unwrap()
    }

    fn keys(plan: &CrossApplyPlan) -> Vec<String> {
        plan.ordered().iter().map(|n| n.key.clone()).collect()
    }

    #[test]
    fn test_root_fields_need_no_joins() {
        let schema = schema();
        let mut plan = CrossApplyPlan::new();

        let binding = plan.add(&resolve(&schema, "Title").unwrap(), false);
        assert_eq!(binding.join, None);
        assert_eq!(binding.suffix, vec!["Title"]);

        // a terminal value array is not expanded
        let binding = plan.add(&resolve(&schema, "Tags").unwrap(), false);
        assert_eq!(binding.join, None);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_shared_prefix_joined_once() {
        let schema = schema();
        let mut plan = CrossApplyPlan::new();

        let a = plan.add(&resolve(&schema, "Comments.Author.Username").unwrap(), false);
        let b = plan.add(&resolve(&schema, "Comments.Content").unwrap(), false);

        assert_eq!(plan.len(), 1);
        assert_eq!(a.join, b.join);
        assert_eq!(a.suffix, vec!["Author", "Username"]);
        assert_eq!(b.suffix, vec!["Content"]);
    }

    #[test]
    fn test_nested_arrays_form_a_tree() {
        let schema = schema();
        let mut plan = CrossApplyPlan::new();

        plan.add(&resolve(&schema, "Meta.Links.Href").unwrap(), false);
        let reply = plan.add(&resolve(&schema, "Comments.Replies.Content").unwrap(), false);
        plan.add(&resolve(&schema, "Comments.Content").unwrap(), false);

        assert_eq!(keys(&plan), vec!["Comments", "Comments.Replies", "Meta.Links"]);

        let replies = plan.node(reply.join.unwrap());
        assert_eq!(replies.json_pointer, vec!["Replies"]);
        assert_eq!(plan.node(replies.parent.unwrap()).key, "Comments");

        let links = plan.ordered()[2];
        assert_eq!(links.parent, None);
        assert_eq!(links.json_pointer, vec!["Meta", "Links"]);
    }

    #[test]
    fn test_sort_paths_flag_whole_chain() {
        let schema = schema();
        let mut plan = CrossApplyPlan::new();

        plan.add(&resolve(&schema, "Comments.Content").unwrap(), false);
        assert!(!plan.requires_group_by());

        plan.add(&resolve(&schema, "Comments.Replies.Author.Username").unwrap(), true);
        assert!(plan.ordered().iter().all(|n| n.requires_group_by));
    }

    #[test]
    fn test_order_is_independent_of_insertion() {
        let schema = schema();
        let paths = ["Comments.Replies.Content", "Meta.Links.Href", "Comments.Content"];

        let mut forward = CrossApplyPlan::new();
        for p in paths {
            forward.add(&resolve(&schema, p).unwrap(), false);
        }
        let mut backward = CrossApplyPlan::new();
        for p in paths.iter().rev() {
            backward.add(&resolve(&schema, p).unwrap(), false);
        }

        assert_eq!(keys(&forward), keys(&backward));
    }
}
