//! Mission bindings.
//! Once a mission's code is spliced, its exports are copied onto a
//! namespace object named after the mission, so two missions defining
//! the same helper never clash. A name that never materialised
//! (e.g. defined under a condition) is skipped at run time.

use crate::compiler::emit::Emitter;

/// The class every mission namespace is an instance of.
pub const NAMESPACE_CLASS: &str = "_MissionModule";

/// Defines the namespace class; emitted once per output program.
pub fn namespace_class(emitter: &mut Emitter) {
    emitter.block(&format!("class {}:", NAMESPACE_CLASS), |e| e.line("pass"));
}

/// Emits the binding block for one mission at the current depth.
pub fn binding(emitter: &mut Emitter, mission: &str, exports: &[String]) {
    emitter.line(&format!("# ---- mission binding: {} ----", mission));
    emitter.line(&format!("{} = {}()", mission, NAMESPACE_CLASS));
    for export in exports {
        emitter.block("try:", |e| e.line(&format!("{}.{} = {}", mission, export, export)));
        emitter.block("except NameError:", |e| e.line("pass"));
    }
}
