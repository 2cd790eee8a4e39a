use std::path::PathBuf;

use kestrel_lib::bytecode::Reg;
use kestrel_lib::vm::Registers;
use kestrel_lib::{FuelLimits, Interpreter, Value};
use serde::Serialize;

use super::program_loader::{load_program, prepare};

pub struct ExecArgs {
    pub program_path: Option<PathBuf>,
    pub eval_text: Option<String>,
    pub json: bool,
    pub pretty: bool,
    pub fuel: u32,
    pub color: bool,
}

/// `--json` output.
#[derive(Serialize)]
pub struct ExecReport<'a> {
    pub printed: &'a [Value],
    pub registers: RegisterReport,
    pub steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct RegisterReport {
    pub eax: i32,
    pub ebx: i32,
    pub ecx: i32,
    pub edx: i32,
    pub esi: i32,
    pub edi: i32,
    pub esp: i32,
    pub ebp: i32,
}

impl From<&Registers> for RegisterReport {
    fn from(r: &Registers) -> Self {
        Self {
            eax: r.get(Reg::Eax),
            ebx: r.get(Reg::Ebx),
            ecx: r.get(Reg::Ecx),
            edx: r.get(Reg::Edx),
            esi: r.get(Reg::Esi),
            edi: r.get(Reg::Edi),
            esp: r.esp,
            ebp: r.ebp,
        }
    }
}

pub fn report(interp: &Interpreter, error: Option<String>) -> ExecReport<'_> {
    ExecReport {
        printed: interp.printed(),
        registers: interp.vm().registers().into(),
        steps: interp.vm().steps(),
        error,
    }
}

pub fn run(args: ExecArgs) {
    let input = load_program(args.program_path.as_deref(), args.eval_text.as_deref())
        .unwrap_or_else(|msg| {
            eprintln!("error: {}", msg);
            std::process::exit(1);
        });

    let builder = Interpreter::builder().limits(FuelLimits::new().exec_fuel(args.fuel));
    let mut interp = prepare(&input, builder, args.color);
    let result = interp.run();

    if args.json {
        let report = report(&interp, result.as_ref().err().map(|e| e.to_string()));
        let output = if args.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };
        match output {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: JSON serialization failed: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        for value in interp.printed() {
            println!("{}", value);
        }
    }

    if let Err(e) = result {
        if !args.json {
            eprintln!("error: {}", e);
        }
        std::process::exit(2);
    }
}
