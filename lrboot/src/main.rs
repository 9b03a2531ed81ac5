use std::{
    env,
    io::{Write, stderr},
    path::Path,
    process,
};

use getopts::Options;
use lrboot::{Bootstrap, Cargo, DEFAULT_REVISION, Git, find_project_root};

fn usage(prog: &str, msg: &str) -> ! {
    let path = Path::new(prog);
    let leaf = match path.file_name() {
        Some(m) => m.to_string_lossy().into_owned(),
        None => "lrboot".to_owned(),
    };
    if !msg.is_empty() {
        writeln!(&mut stderr(), "{}", msg).ok();
    }
    writeln!(
        &mut stderr(),
        "Usage: {} [-r <revision>] [-p <package>] -f <file> [-f <file> ...] <start|finish>",
        leaf
    )
    .ok();
    process::exit(1);
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let prog = &args[0];
    let matches = match Options::new()
        .optflag("h", "help", "")
        .optopt(
            "r",
            "revision",
            &format!("Revision to take snapshots from (default: {})", DEFAULT_REVISION),
            "REV",
        )
        .optopt("p", "package", "Only build this package", "PKG")
        .optmulti("f", "file", "Generated file to stage (repeatable)", "FILE")
        .parse(&args[1..])
    {
        Ok(m) => m,
        Err(f) => usage(prog, f.to_string().as_str()),
    };

    if matches.opt_present("h") {
        usage(prog, "");
    }

    let files = matches.opt_strs("f");
    if files.is_empty() {
        usage(prog, "At least one file must be specified with -f.");
    }
    let cmd = match matches.free.as_slice() {
        [c] if c == "start" || c == "finish" => c.as_str(),
        [c] => usage(prog, &format!("Unknown command '{}'.", c)),
        _ => usage(prog, "Exactly one command must be specified."),
    };

    let cwd = match env::current_dir() {
        Ok(d) => d,
        Err(e) => {
            writeln!(&mut stderr(), "Can't read current directory: {}", e).ok();
            process::exit(1);
        }
    };
    let root = match find_project_root(&cwd) {
        Ok(r) => r,
        Err(e) => {
            writeln!(&mut stderr(), "{}", e).ok();
            process::exit(1);
        }
    };

    let mut bs = Bootstrap::new(&root);
    if let Some(r) = matches.opt_str("r") {
        bs = bs.revision(&r);
    }
    for f in &files {
        bs = bs.file(cwd.join(f));
    }

    match cmd {
        "start" => {
            let mut cargo = Cargo::new();
            if let Some(p) = matches.opt_str("p") {
                cargo = cargo.package(&p);
            }
            match bs.start(&Git::new(&root), &cargo) {
                Ok(written) => {
                    for p in written {
                        println!("Staged {}", p.display());
                    }
                    println!("Bootstrap build finished.");
                }
                Err(e) => {
                    writeln!(&mut stderr(), "{}", e).ok();
                    process::exit(1);
                }
            }
        }
        _ => match bs.finish() {
            Ok(report) => {
                for p in report.removed {
                    println!("Removed {}", p.display());
                }
                for p in report.missing {
                    println!("{} does not exist, skipping.", p.display());
                }
            }
            Err(e) => {
                writeln!(&mut stderr(), "{}", e).ok();
                process::exit(1);
            }
        },
    }
}
