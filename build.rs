fn main() {
    // Propagates the esp-idf build environment when compiling the firmware
    // image; emits nothing for host builds.
    embuild::espidf::sysenv::output();
}
