use std::io::{self, Write};

use crate::sim::{Command, CommandRecord};

/// Write a dispatched-command log to CSV format.
///
/// Columns: tick, time, vessel, target, x, y, z
///
/// `target` is the channel name for channel commands and the axis name for
/// raw input overrides; scalar values occupy `x`.
pub fn write_commands<W: Write>(writer: &mut W, commands: &[CommandRecord]) -> io::Result<()> {
    writeln!(writer, "tick,time,vessel,target,x,y,z")?;

    for r in commands {
        let (target, [x, y, z]) = match r.command {
            Command::Channel(value) => (value.channel().to_string(), value.components()),
            Command::Input { axis, value } => (axis.to_string(), [value, 0.0, 0.0]),
        };
        writeln!(
            writer,
            "{},{:.4},{},{},{:.6},{:.6},{:.6}",
            r.tick, r.sim_time, r.vessel.0, target, x, y, z,
        )?;
    }

    Ok(())
}

/// Write the command log to a CSV file at the given path.
pub fn write_commands_file(path: &str, commands: &[CommandRecord]) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_commands(&mut file, commands)
}
