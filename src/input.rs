//! Host input channel for the rocket's thrusters.
//!
//! The simulation only accepts [`ThrusterCommand`] messages; it never polls
//! devices itself.  [`keyboard_thruster_system`] is the default producer,
//! mapping the arrow keys and applying the host's [`InputPolicy`].

use crate::rocket::{Rocket, Thruster, Thrusters};
use bevy::prelude::*;

/// Switch one thruster on or off.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrusterCommand {
    pub thruster: Thruster,
    pub active: bool,
}

/// Input-layer rules that the simulation itself does not enforce.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputPolicy {
    /// Engaging the brake releases every other thruster.
    pub brake_exclusive: bool,
}

impl Default for InputPolicy {
    fn default() -> Self {
        Self {
            brake_exclusive: true,
        }
    }
}

/// Arrow-key bindings.
pub fn key_for(thruster: Thruster) -> KeyCode {
    match thruster {
        Thruster::Main => KeyCode::ArrowUp,
        Thruster::Left => KeyCode::ArrowLeft,
        Thruster::Right => KeyCode::ArrowRight,
        Thruster::Brake => KeyCode::ArrowDown,
    }
}

/// Translate key edges into thruster commands.
///
/// Only presses and releases produce messages, so a held key costs nothing.
/// With `brake_exclusive`, pressing the brake also releases the other three.
pub fn keyboard_thruster_system(
    keys: Res<ButtonInput<KeyCode>>,
    policy: Res<InputPolicy>,
    mut out: MessageWriter<ThrusterCommand>,
) {
    for thruster in Thruster::ALL {
        let key = key_for(thruster);
        if keys.just_pressed(key) {
            if policy.brake_exclusive && thruster == Thruster::Brake {
                for other in [Thruster::Main, Thruster::Left, Thruster::Right] {
                    out.write(ThrusterCommand {
                        thruster: other,
                        active: false,
                    });
                }
            }
            out.write(ThrusterCommand {
                thruster,
                active: true,
            });
        } else if keys.just_released(key) {
            out.write(ThrusterCommand {
                thruster,
                active: false,
            });
        }
    }
}

/// Apply queued commands to the rocket's flags in arrival order.
pub fn apply_thruster_commands_system(
    mut commands: MessageReader<ThrusterCommand>,
    mut rockets: Query<&mut Thrusters, With<Rocket>>,
) {
    let Ok(mut thrusters) = rockets.single_mut() else {
        commands.clear();
        return;
    };
    for command in commands.read() {
        thrusters.set(command.thruster, command.active);
    }
}
