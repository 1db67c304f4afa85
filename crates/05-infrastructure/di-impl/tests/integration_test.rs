//! 条件组件注册表的集成测试

use config_abstractions::{EmptyPropertyResolver, PropertyResolver};
use di_abstractions::{
    Capabilities, ComponentRegistry, ComponentRegistryExt, ComponentResolverExt, Condition,
    Configuration, Factory,
};
use di_impl::{ApplicationContext, RegistryBuilder};
use infrastructure_common::{DependencyError, FactoryOrigin, StartupRecorder};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 测试用属性源
#[derive(Default)]
struct Properties {
    values: HashMap<String, String>,
    profiles: Vec<String>,
}

impl Properties {
    fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl PropertyResolver for Properties {
    fn get_property(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn active_profiles(&self) -> &[String] {
        &self.profiles
    }
}

fn refresh(builder: RegistryBuilder) -> Result<ApplicationContext, DependencyError> {
    builder.refresh(&EmptyPropertyResolver, &Capabilities::new())
}

/// 测试组件
#[derive(Debug)]
struct FilterChain {
    name: &'static str,
}

#[derive(Debug)]
struct Repository;

#[derive(Debug)]
struct Service {
    repository: Arc<Repository>,
}

#[derive(Debug)]
struct Clock;

#[test]
fn test_ordered_slot_follows_precedence() {
    let mut builder = RegistryBuilder::new();
    builder.declare_ordered::<FilterChain>();
    builder
        .register_factory(Factory::new("b", |_| Ok(FilterChain { name: "B" })).order(1))
        .unwrap();
    builder
        .register_factory(Factory::new("a", |_| Ok(FilterChain { name: "A" })).order(0))
        .unwrap();

    let context = refresh(builder).unwrap();
    let chains = context.get_all::<FilterChain>().unwrap();
    let names: Vec<_> = chains.iter().map(|c| c.name).collect();
    assert_eq!(names, ["A", "B"]);
}

#[test]
fn test_ordered_slot_ties_keep_declaration_order() {
    let mut builder = RegistryBuilder::new();
    builder.declare_ordered::<FilterChain>();
    for name in ["first", "second", "third"] {
        builder
            .register_factory(Factory::new(name, move |_| Ok(FilterChain { name })))
            .unwrap();
    }

    let context = refresh(builder).unwrap();
    let names: Vec<_> = context
        .get_all::<FilterChain>()
        .unwrap()
        .iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["first", "second", "third"]);
}

#[test]
fn test_second_single_factory_is_ambiguous() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(Factory::new("clockA", |_| Ok(Clock)))
        .unwrap();
    builder
        .register_factory(Factory::new("clockB", |_| Ok(Clock)))
        .unwrap();

    match refresh(builder) {
        Err(DependencyError::AmbiguousSlot { candidates, .. }) => {
            assert_eq!(candidates, ["clockA", "clockB"]);
        }
        other => panic!("expected ambiguity, got {:?}", other.map(|c| c.len())),
    }
}

#[test]
fn test_qualified_components_share_a_type() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(Factory::new("systemClock", |_| Ok(Clock)))
        .unwrap();
    builder
        .register_factory(Factory::new("testClock", |_| Ok(Clock)).qualifier("test"))
        .unwrap();

    let context = refresh(builder).unwrap();
    let primary = context.get::<Clock>().unwrap();
    let qualified = context.get_named::<Clock>("test").unwrap();
    assert!(!Arc::ptr_eq(&primary, &qualified));
    assert_eq!(context.get_all::<Clock>().unwrap().len(), 2);
}

#[test]
fn test_singleton_identity_and_dependency_injection() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(
            Factory::new("service", |deps| {
                Ok(Service {
                    repository: deps.get::<Repository>()?,
                })
            })
            .depends_on::<Repository>(),
        )
        .unwrap();
    builder
        .register_factory(Factory::new("repository", |_| Ok(Repository)))
        .unwrap();

    let context = refresh(builder).unwrap();
    let first = context.get::<Service>().unwrap();
    let second = context.get::<Service>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.repository, &context.get::<Repository>().unwrap()));
}

#[test]
fn test_prototype_creates_new_instances() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(Factory::new("clock", |_| Ok(Clock)).prototype())
        .unwrap();

    let context = refresh(builder).unwrap();
    let first = context.get::<Clock>().unwrap();
    let second = context.get::<Clock>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_user_override_backs_off_auto_configuration() {
    struct FilterChainAutoConfiguration;

    impl Configuration for FilterChainAutoConfiguration {
        fn name(&self) -> &str {
            "FilterChainAutoConfiguration"
        }

        fn configure(&self, registry: &mut dyn ComponentRegistry) -> Result<(), DependencyError> {
            registry.register_factory(
                Factory::new("defaultFilterChain", |_| Ok(FilterChain { name: "default" }))
                    .when(Condition::on_missing_component::<FilterChain>()),
            )
        }
    }

    let mut builder = RegistryBuilder::new();
    builder
        .apply_configuration(&FilterChainAutoConfiguration, FactoryOrigin::AutoConfiguration)
        .unwrap();
    builder
        .register_factory(Factory::new("customFilterChain", |_| Ok(FilterChain { name: "custom" })))
        .unwrap();

    let context = refresh(builder).unwrap();
    assert_eq!(context.get::<FilterChain>().unwrap().name, "custom");
    assert!(!context.contains_component("defaultFilterChain"));

    let evaluation = context.condition_report().evaluation("defaultFilterChain").unwrap();
    assert!(!evaluation.matched);
    assert_eq!(evaluation.configuration.as_deref(), Some("FilterChainAutoConfiguration"));
}

#[test]
fn test_auto_configuration_applies_without_override() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(
            Factory::new("defaultClock", |_| Ok(Clock)).when(Condition::on_missing_component::<Clock>()),
        )
        .unwrap();

    let context = refresh(builder).unwrap();
    assert!(context.contains::<Clock>());
    assert_eq!(context.condition_report().positive_matches().count(), 1);
}

#[test]
fn test_cycle_is_reported_with_path() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(
            Factory::new("service", |deps| {
                Ok(Service {
                    repository: deps.get::<Repository>()?,
                })
            })
            .depends_on::<Repository>(),
        )
        .unwrap();
    builder
        .register_factory(Factory::new("repository", |_| Ok(Repository)).depends_on::<Service>())
        .unwrap();

    let error = refresh(builder).unwrap_err();
    assert_eq!(error.to_string(), "循环依赖检测到: service -> repository -> service");
}

#[test]
fn test_missing_dependency_names_factory() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(
            Factory::new("service", |deps| {
                Ok(Service {
                    repository: deps.get::<Repository>()?,
                })
            })
            .depends_on::<Repository>(),
        )
        .unwrap();

    match refresh(builder) {
        Err(DependencyError::MissingDependency { factory, dependency }) => {
            assert_eq!(factory, "service");
            assert_eq!(dependency, "Repository");
        }
        other => panic!("expected missing dependency, got {:?}", other.map(|c| c.len())),
    }
}

#[test]
fn test_optional_dependency_may_be_absent() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(
            Factory::new("clock", |deps| {
                assert!(deps.get_optional::<Repository>()?.is_none());
                Ok(Clock)
            })
            .depends_on_optional::<Repository>(),
        )
        .unwrap();

    assert!(refresh(builder).is_ok());
}

#[test]
fn test_undeclared_dependency_is_rejected() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(Factory::new("repository", |_| Ok(Repository)))
        .unwrap();
    builder
        .register_factory(Factory::new("service", |deps| {
            Ok(Service {
                repository: deps.get::<Repository>()?,
            })
        }))
        .unwrap();

    let context = refresh(builder).unwrap();
    match context.get::<Service>() {
        Err(DependencyError::UndeclaredDependency { factory, dependency }) => {
            assert_eq!(factory, "service");
            assert_eq!(dependency, "Repository");
        }
        other => panic!("expected undeclared dependency, got {:?}", other),
    }
}

#[test]
fn test_eager_factory_failure_is_startup_failure() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(Factory::<Clock>::new("clock", |_| Err(anyhow::anyhow!("时钟不可用"))).eager())
        .unwrap();

    match refresh(builder) {
        Err(DependencyError::ComponentCreationFailed { type_name, .. }) => assert_eq!(type_name, "clock"),
        other => panic!("expected creation failure, got {:?}", other.map(|c| c.len())),
    }
}

#[test]
fn test_factory_failure_surfaces_on_first_resolution() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(Factory::<Clock>::new("clock", |_| Err(anyhow::anyhow!("时钟不可用"))))
        .unwrap();

    let context = refresh(builder).unwrap();
    assert!(matches!(
        context.get::<Clock>(),
        Err(DependencyError::ComponentCreationFailed { .. })
    ));
    assert!(!context.is_instantiated("clock"));
}

#[test]
fn test_duplicate_factory_name_is_rejected() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(Factory::new("clock", |_| Ok(Clock)))
        .unwrap();
    let error = builder
        .register_factory(Factory::new("clock", |_| Ok(Repository)))
        .unwrap_err();
    assert!(matches!(error, DependencyError::RegistrationError { .. }));
}

#[test]
fn test_property_condition_gates_factory() {
    const ACCESS: &str = "management.endpoint.heapdump.access";

    let build = || {
        let mut builder = RegistryBuilder::new();
        builder
            .register_factory(
                Factory::new("heapDump", |_| Ok(Clock))
                    .when(Condition::on_property(ACCESS).having_value("unrestricted")),
            )
            .unwrap();
        builder
    };

    let enabled = build()
        .refresh(&Properties::default().with(ACCESS, "unrestricted"), &Capabilities::new())
        .unwrap();
    assert!(enabled.contains::<Clock>());

    let disabled = build().refresh(&Properties::default(), &Capabilities::new()).unwrap();
    assert!(!disabled.contains::<Clock>());
    assert!(matches!(
        disabled.get::<Clock>(),
        Err(DependencyError::ComponentNotRegistered { .. })
    ));
}

#[test]
fn test_conditions_compose_as_and() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(
            Factory::new("clock", |_| Ok(Clock))
                .when(Condition::on_capability("servlet"))
                .when(Condition::on_property("clock.enabled")),
        )
        .unwrap();

    let properties = Properties::default().with("clock.enabled", "true");
    let context = builder.refresh(&properties, &Capabilities::new()).unwrap();
    assert!(!context.contains::<Clock>());

    let evaluation = context.condition_report().evaluation("clock").unwrap();
    assert_eq!(evaluation.outcomes.len(), 1);
}

#[test]
fn test_configuration_order_is_inherited() {
    struct ActuatorConfiguration;

    impl Configuration for ActuatorConfiguration {
        fn name(&self) -> &str {
            "ActuatorConfiguration"
        }

        fn order(&self) -> i32 {
            1
        }

        fn configure(&self, registry: &mut dyn ComponentRegistry) -> Result<(), DependencyError> {
            registry.register_factory(Factory::new("actuator", |_| Ok(FilterChain { name: "actuator" })))
        }
    }

    let mut builder = RegistryBuilder::new();
    builder.declare_ordered::<FilterChain>();
    builder
        .register_factory(Factory::new("application", |_| Ok(FilterChain { name: "application" })))
        .unwrap();
    builder
        .apply_configuration(&ActuatorConfiguration, FactoryOrigin::User)
        .unwrap();

    let context = refresh(builder).unwrap();
    let names: Vec<_> = context
        .get_all::<FilterChain>()
        .unwrap()
        .iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["actuator", "application"]);
    assert_eq!(context.component("actuator").unwrap().order, 1);
}

#[test]
fn test_singleton_is_created_once_on_first_resolution() {
    static CREATED: AtomicUsize = AtomicUsize::new(0);

    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(
            Factory::new("clock", |_| {
                CREATED.fetch_add(1, Ordering::SeqCst);
                Ok(Clock)
            }),
        )
        .unwrap();

    let context = Arc::new(refresh(builder).unwrap());
    assert!(!context.is_instantiated("clock"));
    assert_eq!(CREATED.load(Ordering::SeqCst), 0);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let context = Arc::clone(&context);
            std::thread::spawn(move || context.get::<Clock>().unwrap())
        })
        .collect();
    let instances: Vec<Arc<Clock>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(CREATED.load(Ordering::SeqCst), 1);
    assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert!(context.is_instantiated("clock"));
}

#[test]
fn test_eager_singleton_is_created_during_refresh() {
    static CREATED: AtomicUsize = AtomicUsize::new(0);

    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(
            Factory::new("clock", |_| {
                CREATED.fetch_add(1, Ordering::SeqCst);
                Ok(Clock)
            })
            .eager(),
        )
        .unwrap();

    let context = refresh(builder).unwrap();
    assert!(context.is_instantiated("clock"));
    assert_eq!(CREATED.load(Ordering::SeqCst), 1);

    context.get::<Clock>().unwrap();
    assert_eq!(CREATED.load(Ordering::SeqCst), 1);
}

#[derive(Debug)]
struct DataSource;

#[derive(Debug)]
struct HealthIndicator;

#[test]
fn test_on_component_activates_when_producer_exists() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(Factory::new("dataSource", |_| Ok(DataSource)))
        .unwrap();
    builder
        .register_factory(
            Factory::new("dataSourceHealth", |_| Ok(HealthIndicator)).when(Condition::on_component::<DataSource>()),
        )
        .unwrap();

    let context = refresh(builder).unwrap();
    assert!(context.contains::<HealthIndicator>());
    assert!(context.condition_report().evaluation("dataSourceHealth").unwrap().matched);
}

#[test]
fn test_on_component_skips_without_producer() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(
            Factory::new("dataSourceHealth", |_| Ok(HealthIndicator)).when(Condition::on_component::<DataSource>()),
        )
        .unwrap();

    let context = refresh(builder).unwrap();
    assert!(!context.contains::<HealthIndicator>());
    assert!(!context.condition_report().evaluation("dataSourceHealth").unwrap().matched);
}

#[test]
fn test_on_component_sees_later_declared_default_producer() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(
            Factory::new("dataSourceHealth", |_| Ok(HealthIndicator)).when(Condition::on_component::<DataSource>()),
        )
        .unwrap();
    builder
        .register_factory(
            Factory::new("defaultDataSource", |_| Ok(DataSource))
                .when(Condition::on_missing_component::<DataSource>()),
        )
        .unwrap();

    let context = refresh(builder).unwrap();
    assert!(context.contains::<DataSource>());
    assert!(context.contains::<HealthIndicator>());
    assert!(context.condition_report().evaluation("dataSourceHealth").unwrap().matched);
}

#[test]
fn test_refresh_records_startup_steps() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_factory(Factory::new("clock", |_| Ok(Clock)).eager())
        .unwrap();
    builder
        .register_factory(
            Factory::new("dataSourceHealth", |_| Ok(HealthIndicator)).when(Condition::on_component::<DataSource>()),
        )
        .unwrap();

    let mut recorder = StartupRecorder::buffering(16);
    let context = builder
        .refresh_recorded(&EmptyPropertyResolver, &Capabilities::new(), &mut recorder)
        .unwrap();

    assert_eq!(context.len(), 1);
    assert_eq!(
        recorder.step_names(),
        [
            "registry.graph.sort",
            "registry.conditions.evaluate",
            "registry.dependencies.validate",
            "registry.singletons.instantiate",
        ]
    );
    let conditions = &recorder.steps()[1];
    assert_eq!(conditions.tags.get("matched").map(String::as_str), Some("1"));
    let singletons = &recorder.steps()[3];
    assert_eq!(singletons.tags.get("created").map(String::as_str), Some("1"));
}
