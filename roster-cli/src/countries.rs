use roster_lib::countries::{CountrySource, HttpSource};
use sysexits::ExitCode;

use crate::fail;

pub fn handle(url: &str) -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => return fail(e, ExitCode::OsErr),
    };

    match runtime.block_on(HttpSource::new(url).fetch()) {
        Ok(names) => {
            for name in names {
                println!("{name}");
            }
            ExitCode::Ok
        }
        Err(e) => fail(e, ExitCode::Unavailable),
    }
}
