//! Status command implementation

use pyrateflash_core::status::{StatusRegister1, StatusRegister2, StatusRegisters};
use pyrateflash_flash::ProgrammerHandle;

/// Print both status registers, raw and decoded
pub fn run_status(handle: &mut ProgrammerHandle) -> Result<(), Box<dyn std::error::Error>> {
    let raw = handle.flash().status_registers()?;
    let regs = StatusRegisters::from_bytes(raw);

    println!("Status Register 1: 0x{:02X}", raw[0]);
    for line in describe_sr1(regs.sr1) {
        println!("  {}", line);
    }
    println!("Status Register 2: 0x{:02X}", raw[1]);
    for line in describe_sr2(regs.sr2) {
        println!("  {}", line);
    }

    Ok(())
}

fn flag(set: bool) -> &'static str {
    if set {
        "1"
    } else {
        "0"
    }
}

fn describe_sr1(sr1: StatusRegister1) -> Vec<String> {
    vec![
        format!("BUSY  {}", flag(sr1.is_busy())),
        format!("WEL   {}", flag(sr1.write_enabled())),
        format!("BP    {} (BP2:BP0)", sr1.block_protect()),
        format!("TB    {}", flag(sr1.contains(StatusRegister1::TB))),
        format!("SEC   {}", flag(sr1.contains(StatusRegister1::SEC))),
        format!("SRP0  {}", flag(sr1.contains(StatusRegister1::SRP0))),
    ]
}

fn describe_sr2(sr2: StatusRegister2) -> Vec<String> {
    let lock_bits = [StatusRegister2::LB1, StatusRegister2::LB2, StatusRegister2::LB3]
        .iter()
        .map(|lb| flag(sr2.contains(*lb)))
        .collect::<Vec<_>>()
        .join("");

    vec![
        format!("SRP1  {}", flag(sr2.contains(StatusRegister2::SRP1))),
        format!("QE    {}", flag(sr2.contains(StatusRegister2::QE))),
        format!("LB1-3 {}", lock_bits),
        format!("CMP   {}", flag(sr2.contains(StatusRegister2::CMP))),
        format!("SUS   {}", flag(sr2.contains(StatusRegister2::SUS))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_sr1() {
        let lines = describe_sr1(StatusRegister1::from_bits_retain(0x1E));
        assert_eq!(lines[0], "BUSY  0");
        assert_eq!(lines[1], "WEL   1");
        assert_eq!(lines[2], "BP    7 (BP2:BP0)");
    }

    #[test]
    fn test_describe_sr2_lock_bits() {
        let lines = describe_sr2(StatusRegister2::from_bits_retain(0x2A));
        assert_eq!(lines[1], "QE    1");
        assert_eq!(lines[2], "LB1-3 101");
    }
}
