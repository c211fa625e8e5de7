use crate::{
    attribute::AttributeId,
    schema::{SchemaCatalog, SchemaInferenceError},
};
use std::fmt;

///
/// SelectNode
///
/// `children == None` is a column; `Some` is a relation being traversed.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectNode {
    name: String,
    children: Option<Vec<Self>>,
}

impl SelectNode {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn children(&self) -> Option<&[Self]> {
        self.children.as_deref()
    }

    fn column(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: None,
        }
    }

    fn is_column(&self, name: &str) -> bool {
        self.children.is_none() && self.name == name
    }

    fn is_relation(&self, name: &str) -> bool {
        self.children.is_some() && self.name == name
    }

    fn collect_leaves(&self, relations: &mut Vec<String>, out: &mut Vec<AttributeId>) {
        match &self.children {
            None => out.push(AttributeId::new(relations.clone(), self.name.clone())),
            Some(children) => {
                relations.push(self.name.clone());
                for child in children {
                    child.collect_leaves(relations, out);
                }
                relations.pop();
            }
        }
    }
}

impl fmt::Display for SelectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.children {
            None => write!(f, "{}", self.name),
            Some(children) => {
                write!(f, "{}(", self.name)?;
                write_list(f, children)?;
                write!(f, ")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, nodes: &[SelectNode]) -> fmt::Result {
    for (index, node) in nodes.iter().enumerate() {
        if index > 0 {
            write!(f, ",")?;
        }
        write!(f, "{node}")?;
    }

    Ok(())
}

///
/// QueryExpression
///
/// Prefix tree of attribute paths, rendered in the backend's nested select
/// syntax. Sibling order is first-encounter order; duplicates are dropped.
/// Every traversed relation carries its own primary key as its first child,
/// so each embedded row stays addressable.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryExpression {
    nodes: Vec<SelectNode>,
}

impl QueryExpression {
    /// Fold attribute paths into one select expression.
    pub fn build<'a>(
        ids: impl IntoIterator<Item = &'a AttributeId>,
        catalog: &SchemaCatalog,
    ) -> Result<Self, SchemaInferenceError> {
        let mut expr = Self::default();
        for id in ids {
            expr.insert(id, catalog)?;
        }

        Ok(expr)
    }

    /// Flat expression over plain columns; no schema needed.
    #[must_use]
    pub fn columns<'a>(columns: impl IntoIterator<Item = &'a str>) -> Self {
        let mut nodes: Vec<SelectNode> = Vec::new();
        for column in columns {
            if !nodes.iter().any(|node| node.is_column(column)) {
                nodes.push(SelectNode::column(column));
            }
        }

        Self { nodes }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn nodes(&self) -> &[SelectNode] {
        &self.nodes
    }

    /// Every addressable column path, injected keys included.
    #[must_use]
    pub fn leaves(&self) -> Vec<AttributeId> {
        let mut out = Vec::new();
        let mut relations = Vec::new();
        for node in &self.nodes {
            node.collect_leaves(&mut relations, &mut out);
        }

        out
    }

    fn insert(&mut self, id: &AttributeId, catalog: &SchemaCatalog) -> Result<(), SchemaInferenceError> {
        let mut level = &mut self.nodes;

        for table in id.relations() {
            let position = if let Some(position) = level.iter().position(|n| n.is_relation(table)) {
                position
            } else {
                let key = catalog.primary_key(table)?;
                level.push(SelectNode {
                    name: table.clone(),
                    children: Some(vec![SelectNode::column(key)]),
                });
                level.len() - 1
            };

            level = level[position].children.get_or_insert_with(Vec::new);
        }

        let column = id.column_name();
        if !level.iter().any(|node| node.is_column(column)) {
            level.push(SelectNode::column(column));
        }

        Ok(())
    }
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, &self.nodes)
    }
}
