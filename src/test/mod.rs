//! Shared scenario factories for unit tests.

use crate::metadata::{
    builder::{CorLib, ModelBuilder},
    token::Token,
    MetadataModel,
};

/// A small application: `Program.Main` calls `Program.Helper`, `Unused` is referenced by
/// nothing.
pub struct SampleApp {
    pub model: MetadataModel,
    pub corlib: CorLib,
    pub assembly: Token,
    pub assembly_name: &'static str,
    pub program: Token,
    pub main: Token,
    pub helper: Token,
    pub unused_type: Token,
    pub unused_method: Token,
}

impl SampleApp {
    pub fn new() -> Self {
        let mut builder = ModelBuilder::new();
        let corlib = builder.corlib();
        let assembly_name = "App";
        let assembly = builder.assembly(assembly_name);

        let program = builder
            .class(assembly, "App", "Program")
            .extends(corlib.object())
            .build();
        let helper = builder
            .method(program, "Helper")
            .static_()
            .private()
            .body(|b| b.ret())
            .build();
        let main = builder
            .method(program, "Main")
            .static_()
            .body(|b| b.call(helper).ret())
            .build();

        let unused_type = builder
            .class(assembly, "App", "Unused")
            .extends(corlib.object())
            .build();
        let unused_method = builder
            .method(unused_type, "Run")
            .body(|b| b.ret())
            .build();

        SampleApp {
            model: builder.finish(),
            corlib,
            assembly,
            assembly_name,
            program,
            main,
            helper,
            unused_type,
            unused_method,
        }
    }
}

/// `Shape.Draw` is virtual; `Circle` is instantiated by `Main` and overrides it, `Square`
/// overrides it but is never created.
pub struct ShapesApp {
    pub model: MetadataModel,
    pub corlib: CorLib,
    pub program: Token,
    pub main: Token,
    pub shape: Token,
    pub shape_draw: Token,
    pub circle: Token,
    pub circle_ctor: Token,
    pub circle_draw: Token,
    pub square: Token,
    pub square_draw: Token,
}

impl ShapesApp {
    pub fn new() -> Self {
        let mut builder = ModelBuilder::new();
        let corlib = builder.corlib();
        let app = builder.assembly("Shapes");

        let shape = builder
            .class(app, "Shapes", "Shape")
            .extends(corlib.object())
            .build();
        let shape_draw = builder
            .method(shape, "Draw")
            .virtual_()
            .newslot()
            .body(|b| b.ret())
            .build();

        let circle = builder
            .class(app, "Shapes", "Circle")
            .extends(shape.into())
            .build();
        let circle_ctor = builder.constructor(circle).build();
        let circle_draw = builder
            .method(circle, "Draw")
            .virtual_()
            .body(|b| b.ret())
            .build();

        let square = builder
            .class(app, "Shapes", "Square")
            .extends(shape.into())
            .build();
        let square_draw = builder
            .method(square, "Draw")
            .virtual_()
            .body(|b| b.ret())
            .build();

        let program = builder
            .class(app, "Shapes", "Program")
            .extends(corlib.object())
            .build();
        let main = builder
            .method(program, "Main")
            .static_()
            .body(|b| {
                b.local(shape.into())
                    .newobj(circle_ctor)
                    .stloc(0)
                    .ldloc(0)
                    .callvirt(shape_draw)
                    .ret()
            })
            .build();

        ShapesApp {
            model: builder.finish(),
            corlib,
            program,
            main,
            shape,
            shape_draw,
            circle,
            circle_ctor,
            circle_draw,
            square,
            square_draw,
        }
    }
}
