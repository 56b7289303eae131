macro_rules! println_with_time {

    () => { println!(); };
    ($($arg:tt)*) => {
        println!("{} ~ {}", chrono::Local::now().format("%H:%M:%S"), format!($($arg)*))
    }
}

macro_rules! eprintln_with_time {

    () => { eprintln!(); };
    ($($arg:tt)*) => {
        eprintln!("{} ~ {}", chrono::Local::now().format("%H:%M:%S"), format!($($arg)*))
    }
}
