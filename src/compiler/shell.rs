//! The fixed parts of a menu program: header, imports, shared state,
//! the run registry and the runtime driving the menu.
//! The `runtime` module models the same behaviour host-side;
//! the constants below are shared with it.

use crate::{
    compiler::{bind, block, emit::Emitter},
    project::run::RunDirectory,
    runtime::{
        selection::{RUN_MIN, STORAGE_LEN, STORAGE_OFFSET},
        task::POLL_MS,
    },
};

pub const GENERATOR: &str = concat!("hubweave ", env!("CARGO_PKG_VERSION"));

/// Header comments. Nothing time-dependent goes here,
/// so unchanged inputs give byte-identical output.
pub fn header(emitter: &mut Emitter, summary: &str, label: Option<&str>, runs: &[&str]) {
    emitter.line(&format!("# {}. Generated by {}; do not edit on the hub.", summary, GENERATOR));
    if let Some(label) = label {
        emitter.line(&format!("# Project: {}", label));
    }
    emitter.line(&format!("# Runs: {}", runs.join(", ")));
}

/// Imports, lazily filled device slots, storage and menu constants,
/// and the mission namespace class.
pub fn prelude(emitter: &mut Emitter) {
    emitter.text(
        "\
from pybricks.hubs import PrimeHub
from pybricks.parameters import Button, Port
from pybricks.pupdevices import ForceSensor
from pybricks.tools import multitask, run_task, wait
",
    );
    emitter.blank();
    emitter.line("_HUB = None");
    emitter.line("_TOUCH = None");
    emitter.line("_TOUCH_PROBED = False");
    emitter.line("_LAST_CONTEXT = None");
    emitter.line(&format!("STORAGE_OFFSET = {}", STORAGE_OFFSET));
    emitter.line(&format!("STORAGE_LEN = {}", STORAGE_LEN));
    emitter.line(&format!("RUN_MIN = {}", RUN_MIN));
    emitter.line(&format!("POLL_MS = {}", POLL_MS));
    emitter.blank();
    emitter.blank();
    bind::namespace_class(emitter);
}

/// Maps the 1-based menu keys to factories, in run order.
pub fn registry(emitter: &mut Emitter, runs: &[RunDirectory]) {
    emitter.line(&format!("RUN_MAX = {}", runs.len()));
    emitter.blank();
    emitter.block("RUNNERS = {", |e| {
        for (index, run) in runs.iter().enumerate() {
            e.line(&format!("\"{}\": {},", index + RUN_MIN as usize, block::factory_name(run)));
        }
    });
    emitter.line("}");
}

/// The runtime: contexts, variant selection, device access,
/// persisted selection, stop watchdog and the menu loop.
pub fn runtime(emitter: &mut Emitter) {
    emitter.text(RUNTIME);
}

const RUNTIME: &str = r#"class StopRequested(Exception):
    pass


class RunContext:
    def __init__(self, hub, robot, left_wheel, right_wheel, left_lift, right_lift):
        self.hub = hub
        self.robot = robot
        self.left_wheel = left_wheel
        self.right_wheel = right_wheel
        self.left_lift = left_lift
        self.right_lift = right_lift

    def motors(self):
        return (self.robot, self.left_wheel, self.right_wheel, self.left_lift, self.right_lift)


class RunBundle:
    def __init__(self, setup, run):
        self.setup = setup
        self.run = run


def _select_variant(table, override, default):
    if override and override in table:
        return table[override]
    for name in table:
        if getattr(table[name], "IS_CURRENT", False):
            return table[name]
    return table.get(default)


def _get_hub():
    global _HUB
    if _HUB is None:
        _HUB = PrimeHub()
    return _HUB


def _get_touch():
    global _TOUCH, _TOUCH_PROBED
    if not _TOUCH_PROBED:
        _TOUCH_PROBED = True
        for port in (Port.A, Port.B, Port.C, Port.D, Port.E, Port.F):
            try:
                _TOUCH = ForceSensor(port)
                break
            except Exception:
                pass
    return _TOUCH


def _set_stop_button(buttons):
    try:
        _get_hub().system.set_stop_button(buttons)
    except Exception:
        pass


def _pressed_buttons():
    try:
        return _get_hub().buttons.pressed()
    except Exception:
        return ()


def _touch_pressed():
    sensor = _get_touch()
    if sensor is None:
        return False
    try:
        return sensor.pressed()
    except Exception:
        try:
            return sensor.touched()
        except Exception:
            return False


def _wait_touch_release():
    while _touch_pressed():
        wait(POLL_MS)


def _wait_for_release(button):
    while button in _pressed_buttons():
        wait(POLL_MS)


def _read_last_selection():
    try:
        data = _get_hub().system.storage(STORAGE_OFFSET, read=STORAGE_LEN)
    except Exception:
        return None
    if not data:
        return None
    value = data[0]
    if RUN_MIN <= value <= RUN_MAX:
        return value
    return None


def _write_last_selection(value):
    if not RUN_MIN <= value <= RUN_MAX:
        return
    try:
        _get_hub().system.storage(STORAGE_OFFSET, write=bytes([value]))
    except Exception:
        pass


def _show(selected):
    hub = _get_hub()
    try:
        hub.display.text(str(selected))
    except Exception:
        try:
            hub.display.number(selected)
        except Exception:
            pass


def _stop_all_motors():
    ctx = _LAST_CONTEXT
    if ctx is None:
        return
    for motor in ctx.motors():
        try:
            motor.stop()
        except Exception:
            pass


async def _monitor_stop():
    while True:
        if Button.CENTER in _pressed_buttons():
            _stop_all_motors()
            raise StopRequested()
        await wait(POLL_MS)


def _run_selected(selected):
    global _LAST_CONTEXT
    factory = RUNNERS.get(str(selected))
    if factory is None:
        return
    try:
        bundle = factory()
        ctx = RunContext(*bundle.setup())
        _LAST_CONTEXT = ctx
        run_task(multitask(_monitor_stop(), bundle.run(ctx), race=True))
    except StopRequested:
        _wait_for_release(Button.CENTER)
        return
    except Exception as exc:
        print("Run failed:", exc)
    _stop_all_motors()


def select_loop():
    _set_stop_button((Button.CENTER, Button.BLUETOOTH))
    selected = _read_last_selection() or RUN_MIN
    while True:
        _show(selected)
        if _touch_pressed():
            _wait_touch_release()
            _write_last_selection(selected)
            _run_selected(selected)
            _wait_touch_release()
        pressed = _pressed_buttons()
        if Button.LEFT in pressed:
            _wait_for_release(Button.LEFT)
            selected = RUN_MAX if selected <= RUN_MIN else selected - 1
            _write_last_selection(selected)
        elif Button.RIGHT in pressed:
            _wait_for_release(Button.RIGHT)
            selected = RUN_MIN if selected >= RUN_MAX else selected + 1
            _write_last_selection(selected)
        wait(POLL_MS)


def main():
    return select_loop()


if __name__ == "__main__":
    main()
"#;
