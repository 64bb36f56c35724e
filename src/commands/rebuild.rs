//! `mend rebuild` command.

use std::path::Path;

use crate::config::MendConfig;
use crate::context::ServiceContext;
use crate::orchestrator::Orchestrator;

/// Execute the `rebuild` command.
///
/// Rescans the project whatever the update policy says, carries history
/// over from the stored structure, then saves and archives the result.
///
/// # Errors
///
/// Returns an error string if the structure cannot be persisted.
pub fn run(ctx: &ServiceContext, config: &MendConfig, project_root: &Path) -> Result<(), String> {
    let orchestrator = Orchestrator::new(ctx, config, project_root).map_err(|e| e.to_string())?;
    let store = orchestrator.store();

    let tree = orchestrator.rebuild(store.load().as_ref());
    store.save(&tree).map_err(|e| e.to_string())?;
    let archive = store.archive(&tree).map_err(|e| e.to_string())?;

    println!(
        "Rebuilt test structure: {} module(s), {} class(es), {} method(s).",
        tree.modules.len(),
        tree.class_count(),
        tree.method_count()
    );
    println!("Archived to {}", archive.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixed::SteppingClock;
    use crate::adapters::memory::MemoryFileSystem;
    use crate::adapters::replaying::fixtures::replayer;
    use crate::adapters::replaying::ReplayingTestDiscovery;
    use crate::cassette::config::CassetteConfig;
    use crate::store::GraphStore;
    use serde_json::json;

    #[test]
    fn rebuild_saves_and_archives() {
        let mut ctx = ServiceContext::replaying_from(&CassetteConfig::default()).unwrap();
        ctx.fs = Box::new(MemoryFileSystem::with_files([
            ("/p/app/pom.xml", "<project/>"),
            ("/p/app/src/test/kotlin/com/example/CalcTest.kt", "class CalcTest"),
        ]));
        ctx.clock = Box::new(SteppingClock::starting_at("2025-03-01T12:00:00Z"));
        ctx.discovery = Box::new(ReplayingTestDiscovery::new(replayer(&[(
            "discovery",
            "discover_methods",
            json!([{"id": "adds", "name": "adds", "display_name": "adds()"}]),
        )])));
        let config = MendConfig::default();

        run(&ctx, &config, Path::new("/p")).unwrap();

        let store = GraphStore::new(&ctx, Path::new("/p/.mend"));
        let tree = store.load().unwrap();
        assert_eq!(tree.method_count(), 1);
        assert_eq!(tree.modules[0].id, "app");
        assert_eq!(store.list_archives().len(), 1);
    }
}
