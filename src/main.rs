use clap::{arg, crate_version, Command};
use adaptive_huffman::{driver, Options};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let long_help =
"Examples:
---------
Encode:  `adaptive-huffman encode -s my_file.txt`
Decode:  `adaptive-huffman decode my_file.bits`
Either command with no file arguments reads from stdin.";

    let mut main_cmd = Command::new("adaptive-huffman")
        .about("Adaptive Huffman coding (Vitter's algorithm) over a textual bitstream")
        .after_long_help(long_help)
        .version(crate_version!())
        .subcommand_required(true);
    main_cmd = main_cmd.subcommand(Command::new("encode")
        .arg(arg!(-s --split "cosmetically group encoded bits by input byte").required(false))
        .arg(arg!([PATHS] ... "input paths, or stdin if omitted"))
        .about("encode lines of input into a textual bit sequence"));

    main_cmd = main_cmd.subcommand(Command::new("decode")
        .arg(arg!(-s --split "accepted for symmetry; decoding is unaffected").required(false))
        .arg(arg!([PATHS] ... "input paths, or stdin if omitted"))
        .about("decode lines of a textual bit sequence back into bytes"));

    let matches = main_cmd.get_matches();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Some(cmd) = matches.subcommand_matches("encode") {
        let opt = Options { split: cmd.get_flag("split") };
        let paths: Vec<String> = cmd.get_many::<String>("PATHS")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default();
        driver::encode_paths(&paths, &mut out, &opt);
    }

    if let Some(cmd) = matches.subcommand_matches("decode") {
        let opt = Options { split: cmd.get_flag("split") };
        let paths: Vec<String> = cmd.get_many::<String>("PATHS")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default();
        driver::decode_paths(&paths, &mut out, &opt);
    }

    Ok(())
}
