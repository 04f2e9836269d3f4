use std::collections::HashMap;

use crate::pass::RenderPassType;

/// 节点名 -> 注册下标
#[derive(Default, Debug)]
pub struct GraphNodeRegistry {
    indices: HashMap<String, usize>,
}
impl GraphNodeRegistry {
    pub fn insert(&mut self, name: &str, index: usize) {
        self.indices.insert(name.to_string(), index);
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// 删除节点后下标会整体前移，按新的顺序重建
    pub fn rebuild<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        self.indices.clear();
        for (index, name) in names.into_iter().enumerate() {
            self.indices.insert(name.to_string(), index);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// pass 类型 -> pass 名
#[derive(Default, Debug)]
pub struct RenderGraphNameRegistry {
    by_type: HashMap<RenderPassType, Vec<String>>,
}
impl RenderGraphNameRegistry {
    pub fn insert(&mut self, pass_type: RenderPassType, name: &str) {
        let names = self.by_type.entry(pass_type).or_default();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    pub fn remove(&mut self, name: &str) {
        for names in self.by_type.values_mut() {
            names.retain(|n| n != name);
        }
    }

    pub fn names_of(&self, pass_type: RenderPassType) -> &[String] {
        self.by_type.get(&pass_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn type_of(&self, name: &str) -> Option<RenderPassType> {
        self.by_type.iter().find(|(_, names)| names.iter().any(|n| n == name)).map(|(ty, _)| *ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_registry_rebuild() {
        let mut registry = GraphNodeRegistry::default();
        registry.insert("a", 0);
        registry.insert("b", 1);
        registry.insert("c", 2);

        registry.rebuild(["a", "c"]);
        assert_eq!(registry.get("c"), Some(1));
        assert!(!registry.contains("b"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_name_registry() {
        let mut registry = RenderGraphNameRegistry::default();
        registry.insert(RenderPassType::OneHit, "brdf_lut");
        registry.insert(RenderPassType::Trigger, "screenshot");
        registry.insert(RenderPassType::Trigger, "screenshot");

        assert_eq!(registry.names_of(RenderPassType::Trigger), ["screenshot"]);
        assert_eq!(registry.type_of("brdf_lut"), Some(RenderPassType::OneHit));
        assert!(registry.names_of(RenderPassType::Default).is_empty());

        registry.remove("screenshot");
        assert_eq!(registry.type_of("screenshot"), None);
    }
}
