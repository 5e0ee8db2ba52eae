//! 约定规范定义
//!
//! 提供按类型名称推导默认作用域的注册期约定。约定只在批量注册时求值，
//! 解析路径上不做任何基于字符串的推导。

use crate::scope::ProviderScope;

/// 约定规则
#[derive(Debug, Clone)]
pub struct ConventionRule {
    /// 名称模式，支持单个 `*` 通配符
    pub pattern: String,
    /// 匹配时采用的默认作用域
    pub scope: ProviderScope,
    /// 优先级，数值越高越先匹配
    pub priority: i32,
}

impl ConventionRule {
    /// 创建新的约定规则
    pub fn new(pattern: impl Into<String>, scope: ProviderScope) -> Self {
        Self {
            pattern: pattern.into(),
            scope,
            priority: 0,
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 检查名称是否匹配此规则
    pub fn matches(&self, name: &str) -> bool {
        if self.pattern.contains('*') {
            let parts: Vec<&str> = self.pattern.split('*').collect();

            if parts.len() == 2 {
                name.starts_with(parts[0]) && name.ends_with(parts[1])
            } else {
                false
            }
        } else {
            name == self.pattern
        }
    }
}

/// 注册期约定规范
///
/// 默认规则把控制器、服务和管理器类组件放入全局作用域共享，
/// 其余组件按非缓存处理。
#[derive(Debug)]
pub struct ConventionRules {
    rules: Vec<ConventionRule>,
}

impl ConventionRules {
    /// 创建带默认规则的约定规范
    pub fn new() -> Self {
        let mut conventions = Self { rules: Vec::new() };
        conventions.register_default_conventions();
        conventions
    }

    /// 创建空的约定规范
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// 注册默认约定
    fn register_default_conventions(&mut self) {
        self.add_rule(
            ConventionRule::new("*Controller", ProviderScope::global()).with_priority(100),
        );
        self.add_rule(ConventionRule::new("*Service", ProviderScope::global()).with_priority(90));
        self.add_rule(ConventionRule::new("*Manager", ProviderScope::global()).with_priority(90));
    }

    /// 添加约定规则
    pub fn add_rule(&mut self, rule: ConventionRule) {
        self.rules.push(rule);
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// 获取所有约定规则
    pub fn rules(&self) -> &[ConventionRule] {
        &self.rules
    }

    /// 根据类型简称推导默认作用域
    pub fn scope_for(&self, short_name: &str) -> ProviderScope {
        self.rules
            .iter()
            .find(|rule| rule.matches(short_name))
            .map(|rule| rule.scope.clone())
            .unwrap_or(ProviderScope::Unscoped)
    }
}

impl Default for ConventionRules {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::GLOBAL_SCOPE;

    #[test]
    fn controller_suffix_maps_to_global_scope() {
        let conventions = ConventionRules::new();
        assert_eq!(
            conventions.scope_for("NavigationController"),
            ProviderScope::named(GLOBAL_SCOPE)
        );
    }

    #[test]
    fn unknown_suffix_maps_to_unscoped() {
        let conventions = ConventionRules::new();
        assert_eq!(conventions.scope_for("CounterModel"), ProviderScope::Unscoped);
    }

    #[test]
    fn higher_priority_rule_wins() {
        let mut conventions = ConventionRules::empty();
        conventions.add_rule(ConventionRule::new("*Service", ProviderScope::Unscoped));
        conventions.add_rule(
            ConventionRule::new("Audit*", ProviderScope::named("audit")).with_priority(10),
        );

        assert_eq!(
            conventions.scope_for("AuditService"),
            ProviderScope::named("audit")
        );
    }
}
